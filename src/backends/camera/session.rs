// SPDX-License-Identifier: GPL-3.0-only

//! Capture session lifecycle
//!
//! ```text
//!            open()                 preview ok
//! Closed ───────────► Initializing ───────────► Previewing
//!   ▲                      │                        │
//!   │     denied / failed  │ device busy            │ close() / fail()
//!   ├──────────────────────┘                        │
//!   │                      ▼                        │
//!   │               PreviewBlocked ── retry ok ─────┤
//!   │                      │                        │
//!   └──────────────────────┴────────────────────────┘
//! ```
//!
//! A stream that reports the device busy after it started moves the session
//! from `Previewing` back to `PreviewBlocked` (`block_preview`).
//!
//! `suspend` closes the session and refuses every `open` until `resume`, so
//! an open queued behind a suspend never reacquires the device.
//!
//! The open device and the display keep-alive guard live together in the
//! session; `close` releases both, and so does dropping the last handle.
//! Every operation holds the session lock for its whole duration, so
//! operations issued from different tasks never interleave.

use super::types::*;
use super::CameraBackend;
use crate::errors::CameraError;
use crate::power::{KeepAliveGuard, KeepAliveRequest, SuspendDeferral};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    /// Device being acquired; only observable from inside `open`
    Initializing,
    Previewing,
    /// Device open, but another process holds exclusive access
    PreviewBlocked,
}

impl SessionState {
    /// Device handle held
    pub fn is_open(&self) -> bool {
        !matches!(self, SessionState::Closed)
    }
}

struct SessionInner {
    backend: Box<dyn CameraBackend>,
    keep_alive: KeepAliveRequest,
    state: SessionState,
    device: Option<CameraDevice>,
    keep_alive_guard: Option<KeepAliveGuard>,
    /// Stream produced by the last successful preview start, until taken
    stream: Option<PreviewStream>,
    /// Bumped on every transition into `Previewing`
    generation: u64,
    suspended: bool,
}

impl SessionInner {
    fn release(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        info!(state = ?self.state, "Releasing camera session");

        if self.state == SessionState::Previewing
            && let Err(e) = self.backend.stop_preview()
        {
            warn!(error = %e, "Failed to stop preview cleanly");
        }
        self.stream = None;
        // Guard drop releases the keep-alive request exactly once
        self.keep_alive_guard = None;
        self.backend.release();
        self.device = None;
        self.state = SessionState::Closed;
        true
    }

    /// Start streaming; sorts the outcome into previewing, blocked, or failed
    fn try_start_preview(&mut self) -> Result<SessionState, CameraError> {
        match self.backend.start_preview() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.generation += 1;
                self.state = SessionState::Previewing;
                info!(generation = self.generation, "Camera session previewing");
                Ok(SessionState::Previewing)
            }
            Err(CameraError::DeviceBusy) => {
                self.state = SessionState::PreviewBlocked;
                info!("Camera held exclusively by another application, preview blocked");
                Ok(SessionState::PreviewBlocked)
            }
            Err(e) => {
                error!(error = %e, "Preview failed, releasing camera");
                self.release();
                Err(e)
            }
        }
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.release();
    }
}

/// Shared handle to the page's camera session
#[derive(Clone)]
pub struct CaptureSession {
    inner: Arc<Mutex<SessionInner>>,
}

impl CaptureSession {
    pub fn new(backend: Box<dyn CameraBackend>, keep_alive: KeepAliveRequest) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                backend,
                keep_alive,
                state: SessionState::Closed,
                device: None,
                keep_alive_guard: None,
                stream: None,
                generation: 0,
                suspended: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Counter identifying the current preview stream
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn device(&self) -> Option<CameraDevice> {
        self.lock().device.clone()
    }

    /// Acquire `device` and start the preview.
    ///
    /// On return the session is `Previewing`, `PreviewBlocked`, or `Closed`
    /// with the error returned. An already open session is left untouched.
    pub fn open(&self, device: &CameraDevice) -> Result<SessionState, CameraError> {
        let mut inner = self.lock();
        if inner.state.is_open() {
            return Err(CameraError::AlreadyOpen);
        }
        if inner.suspended {
            info!(device = %device, "Not opening camera while the system suspends");
            return Err(CameraError::Suspended);
        }

        info!(device = %device, "Opening camera session");
        inner.state = SessionState::Initializing;

        if let Err(e) = inner.backend.open(device) {
            error!(error = %e, "Failed to acquire camera");
            inner.backend.release();
            inner.state = SessionState::Closed;
            return Err(e);
        }
        inner.device = Some(device.clone());
        let guard = inner.keep_alive.request_active();
        inner.keep_alive_guard = Some(guard);

        inner.try_start_preview()
    }

    /// Re-attempt the preview while blocked; no-op in any other state
    pub fn retry_preview(&self) -> Result<SessionState, CameraError> {
        let mut inner = self.lock();
        if inner.state != SessionState::PreviewBlocked {
            return Ok(inner.state);
        }
        debug!("Retrying blocked preview");
        inner.try_start_preview()
    }

    /// The running stream reported the device busy: stop streaming but keep
    /// the device and the keep-alive so the preview can be retried.
    ///
    /// Only acts on a previewing session; returns the resulting state.
    pub fn block_preview(&self) -> SessionState {
        let mut inner = self.lock();
        if inner.state != SessionState::Previewing {
            return inner.state;
        }
        info!("Preview lost exclusive access, waiting for the device");
        if let Err(e) = inner.backend.stop_preview() {
            warn!(error = %e, "Failed to stop preview cleanly");
        }
        inner.stream = None;
        inner.state = SessionState::PreviewBlocked;
        SessionState::PreviewBlocked
    }

    /// Take the stream of the current preview (once per generation)
    pub fn take_preview_stream(&self) -> Option<PreviewStream> {
        self.lock().stream.take()
    }

    /// Grab the newest preview frame
    pub fn capture_still(&self) -> Result<Arc<CameraFrame>, CameraError> {
        let inner = self.lock();
        if inner.state != SessionState::Previewing {
            return Err(CameraError::NotPreviewing);
        }
        inner
            .backend
            .latest_frame()
            .ok_or(CameraError::NoFrameAvailable)
    }

    /// Stop preview, release keep-alive and device.
    ///
    /// Safe to call any number of times; returns whether anything was released.
    pub fn close(&self) -> bool {
        self.lock().release()
    }

    /// Release everything for a system suspend and refuse opens until `resume`.
    ///
    /// Returns whether a device was released.
    pub fn suspend(&self) -> bool {
        let mut inner = self.lock();
        inner.suspended = true;
        inner.release()
    }

    /// Suspend the session, then let the system suspend proceed.
    ///
    /// The deferral completes only after the device is released.
    pub fn release_for_suspend(&self, deferral: &SuspendDeferral) -> bool {
        let released = self.suspend();
        deferral.complete();
        released
    }

    /// Allow opens again after a system resume
    pub fn resume(&self) {
        let mut inner = self.lock();
        if inner.suspended {
            debug!("Camera session accepts opens again");
            inner.suspended = false;
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.lock().suspended
    }

    /// Runtime device failure: release everything and hand the error back
    pub fn fail(&self, error: CameraError) -> CameraError {
        error!(error = %error, "Camera session failed");
        self.close();
        error
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CaptureSession")
            .field("state", &inner.state)
            .field("device", &inner.device)
            .field("generation", &inner.generation)
            .field("suspended", &inner.suspended)
            .finish()
    }
}
