// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  Capture page (App) │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    CaptureSession   │  ← Lifecycle, keep-alive, guaranteed release
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Device access + streaming
//! └──────────┬──────────┘
//!            │
//!            ▼
//!      ┌───────────┐
//!      │ GStreamer │  ← pipewiresrc / v4l2src
//!      └───────────┘
//! ```

pub mod enumeration;
pub mod pipeline;
pub mod portal;
pub mod session;
pub mod types;

pub use enumeration::enumerate_cameras;
pub use session::{CaptureSession, SessionState};
pub use types::*;

use std::sync::Arc;

/// Device access and streaming
///
/// Implementations must tolerate `stop_preview` and `release` being called
/// in any state; the session relies on that to release on every exit path.
pub trait CameraBackend: Send {
    /// Acquire the device. Permission problems surface here as `AccessDenied`.
    fn open(&mut self, device: &CameraDevice) -> BackendResult<()>;

    /// Start streaming. `DeviceBusy` when another process holds exclusive access.
    fn start_preview(&mut self) -> BackendResult<PreviewStream>;

    /// Stop streaming but keep the device
    fn stop_preview(&mut self) -> BackendResult<()>;

    /// Most recent frame delivered by the stream
    fn latest_frame(&self) -> Option<Arc<CameraFrame>>;

    /// Release the device handle
    fn release(&mut self);

    fn is_open(&self) -> bool;
}
