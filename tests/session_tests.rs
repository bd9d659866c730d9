// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture session lifecycle

use jolt::backends::camera::{
    BackendResult, CameraBackend, CameraDevice, CameraFrame, CaptureSession, DeviceSource,
    PreviewStream, SessionState,
};
use jolt::errors::CameraError;
use jolt::power::sleep::SleepDelayLock;
use jolt::power::{DisplayInhibitor, KeepAliveRequest, SuspendDeferral};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// What the fake device does, and what was done to it
#[derive(Default)]
struct Script {
    open_error: Option<CameraError>,
    /// Outcomes of successive `start_preview` calls; empty means success
    start_results: VecDeque<Result<(), CameraError>>,
    frame: Option<Arc<CameraFrame>>,
    is_open: bool,
    streaming: bool,
    opens: u32,
    releases: u32,
    stops: u32,
    /// Suspend deferral observed at each release
    deferral: Option<SuspendDeferral>,
    pending_at_release: Vec<bool>,
}

struct FakeBackend {
    script: Arc<Mutex<Script>>,
}

impl CameraBackend for FakeBackend {
    fn open(&mut self, _device: &CameraDevice) -> BackendResult<()> {
        let mut script = self.script.lock().unwrap();
        if let Some(err) = script.open_error.clone() {
            return Err(err);
        }
        script.is_open = true;
        script.opens += 1;
        Ok(())
    }

    fn start_preview(&mut self) -> BackendResult<PreviewStream> {
        let mut script = self.script.lock().unwrap();
        script.start_results.pop_front().unwrap_or(Ok(()))?;
        script.streaming = true;
        let (_frames, _failures, stream) = PreviewStream::channel(4);
        Ok(stream)
    }

    fn stop_preview(&mut self) -> BackendResult<()> {
        let mut script = self.script.lock().unwrap();
        if script.streaming {
            script.streaming = false;
            script.stops += 1;
        }
        Ok(())
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.script.lock().unwrap().frame.clone()
    }

    fn release(&mut self) {
        let mut script = self.script.lock().unwrap();
        if script.is_open {
            script.is_open = false;
            script.releases += 1;
            let pending = script.deferral.as_ref().map(SuspendDeferral::is_pending);
            if let Some(pending) = pending {
                script.pending_at_release.push(pending);
            }
        }
    }

    fn is_open(&self) -> bool {
        self.script.lock().unwrap().is_open
    }
}

#[derive(Default)]
struct CountingInhibitor {
    inhibits: AtomicU32,
    uninhibits: AtomicU32,
}

impl DisplayInhibitor for CountingInhibitor {
    fn inhibit(&self) -> Result<u32, String> {
        Ok(self.inhibits.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn uninhibit(&self, _cookie: u32) -> Result<(), String> {
        self.uninhibits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    session: CaptureSession,
    script: Arc<Mutex<Script>>,
    inhibitor: Arc<CountingInhibitor>,
    keep_alive: KeepAliveRequest,
}

impl Harness {
    fn new(script: Script) -> Self {
        let script = Arc::new(Mutex::new(script));
        let inhibitor = Arc::new(CountingInhibitor::default());
        let keep_alive = KeepAliveRequest::new(inhibitor.clone());
        let backend = FakeBackend {
            script: script.clone(),
        };
        Self {
            session: CaptureSession::new(Box::new(backend), keep_alive.clone()),
            script,
            inhibitor,
            keep_alive,
        }
    }

    fn releases(&self) -> u32 {
        self.script.lock().unwrap().releases
    }

    fn uninhibits(&self) -> u32 {
        self.inhibitor.uninhibits.load(Ordering::SeqCst)
    }
}

fn device() -> CameraDevice {
    CameraDevice {
        name: "Test Camera".to_string(),
        source: DeviceSource::V4l2 {
            path: "/dev/video0".to_string(),
        },
    }
}

fn delay_lock() -> SleepDelayLock {
    let file = std::fs::File::open("/dev/null").unwrap();
    SleepDelayLock::from(std::os::fd::OwnedFd::from(file))
}

#[test]
fn test_open_starts_preview_and_keep_alive() {
    let h = Harness::new(Script::default());

    assert_eq!(h.session.open(&device()), Ok(SessionState::Previewing));
    assert_eq!(h.session.state(), SessionState::Previewing);
    assert_eq!(h.keep_alive.active_count(), 1);
    assert_eq!(h.inhibitor.inhibits.load(Ordering::SeqCst), 1);
    assert_eq!(h.session.device(), Some(device()));
    assert!(h.session.take_preview_stream().is_some());
    assert!(h.session.take_preview_stream().is_none());
}

#[test]
fn test_denied_access_leaves_session_closed() {
    let h = Harness::new(Script {
        open_error: Some(CameraError::AccessDenied),
        ..Default::default()
    });

    assert_eq!(h.session.open(&device()), Err(CameraError::AccessDenied));
    assert_eq!(h.session.state(), SessionState::Closed);
    assert_eq!(h.keep_alive.active_count(), 0);
    assert_eq!(h.inhibitor.inhibits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_busy_device_blocks_preview_and_keeps_device() {
    let h = Harness::new(Script {
        start_results: VecDeque::from([Err(CameraError::DeviceBusy)]),
        ..Default::default()
    });

    assert_eq!(h.session.open(&device()), Ok(SessionState::PreviewBlocked));
    assert!(h.script.lock().unwrap().is_open);
    assert_eq!(h.keep_alive.active_count(), 1);
    assert!(matches!(
        h.session.capture_still(),
        Err(CameraError::NotPreviewing)
    ));
}

#[test]
fn test_failed_preview_releases_everything() {
    let h = Harness::new(Script {
        start_results: VecDeque::from([Err(CameraError::DeviceFailed("no signal".into()))]),
        ..Default::default()
    });

    assert!(matches!(
        h.session.open(&device()),
        Err(CameraError::DeviceFailed(_))
    ));
    assert_eq!(h.session.state(), SessionState::Closed);
    assert_eq!(h.releases(), 1);
    assert_eq!(h.keep_alive.active_count(), 0);
    assert_eq!(h.uninhibits(), 1);
}

#[test]
fn test_retry_moves_from_blocked_to_previewing() {
    let h = Harness::new(Script {
        start_results: VecDeque::from([
            Err(CameraError::DeviceBusy),
            Err(CameraError::DeviceBusy),
        ]),
        ..Default::default()
    });

    h.session.open(&device()).unwrap();
    let generation = h.session.generation();

    assert_eq!(h.session.retry_preview(), Ok(SessionState::PreviewBlocked));
    assert_eq!(h.session.retry_preview(), Ok(SessionState::Previewing));
    assert!(h.session.generation() > generation);
    // No-op once previewing
    assert_eq!(h.session.retry_preview(), Ok(SessionState::Previewing));
}

#[test]
fn test_retry_on_closed_session_is_noop() {
    let h = Harness::new(Script::default());
    assert_eq!(h.session.retry_preview(), Ok(SessionState::Closed));
}

#[test]
fn test_open_twice_is_rejected() {
    let h = Harness::new(Script::default());
    h.session.open(&device()).unwrap();

    assert_eq!(h.session.open(&device()), Err(CameraError::AlreadyOpen));
    assert_eq!(h.session.state(), SessionState::Previewing);
    assert_eq!(h.script.lock().unwrap().opens, 1);
    assert_eq!(h.keep_alive.active_count(), 1);
}

#[test]
fn test_close_is_idempotent() {
    let h = Harness::new(Script::default());
    h.session.open(&device()).unwrap();

    assert!(h.session.close());
    assert!(!h.session.close());

    assert_eq!(h.session.state(), SessionState::Closed);
    assert_eq!(h.releases(), 1);
    assert_eq!(h.script.lock().unwrap().stops, 1);
    assert_eq!(h.uninhibits(), 1);
    assert_eq!(h.keep_alive.active_count(), 0);
}

#[test]
fn test_session_can_reopen_after_close() {
    let h = Harness::new(Script::default());
    h.session.open(&device()).unwrap();
    h.session.close();

    assert_eq!(h.session.open(&device()), Ok(SessionState::Previewing));
    assert_eq!(h.script.lock().unwrap().opens, 2);
    assert_eq!(h.inhibitor.inhibits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_capture_returns_latest_frame() {
    let frame = Arc::new(CameraFrame::from_rgba(2, 2, vec![7; 16]));
    let h = Harness::new(Script {
        frame: Some(frame.clone()),
        ..Default::default()
    });

    assert!(matches!(
        h.session.capture_still(),
        Err(CameraError::NotPreviewing)
    ));
    h.session.open(&device()).unwrap();
    let captured = h.session.capture_still().unwrap();
    assert!(Arc::ptr_eq(&captured, &frame));
}

#[test]
fn test_capture_without_frame_reports_it() {
    let h = Harness::new(Script::default());
    h.session.open(&device()).unwrap();
    assert!(matches!(
        h.session.capture_still(),
        Err(CameraError::NoFrameAvailable)
    ));
}

#[test]
fn test_device_failure_releases_session() {
    let h = Harness::new(Script::default());
    h.session.open(&device()).unwrap();

    let err = h.session.fail(CameraError::DeviceFailed("unplugged".into()));
    assert_eq!(err, CameraError::DeviceFailed("unplugged".into()));
    assert_eq!(h.session.state(), SessionState::Closed);
    assert_eq!(h.releases(), 1);
    assert_eq!(h.uninhibits(), 1);
}

#[test]
fn test_dropping_last_handle_releases() {
    let h = Harness::new(Script::default());
    h.session.open(&device()).unwrap();

    let Harness {
        session,
        script,
        inhibitor,
        keep_alive,
    } = h;
    let clone = session.clone();
    drop(session);
    // Another handle still alive
    assert_eq!(script.lock().unwrap().releases, 0);

    drop(clone);
    assert_eq!(script.lock().unwrap().releases, 1);
    assert_eq!(inhibitor.uninhibits.load(Ordering::SeqCst), 1);
    assert_eq!(keep_alive.active_count(), 0);
}

#[test]
fn test_suspend_releases_before_deferral_completes() {
    let deferral = SuspendDeferral::new(Some(delay_lock()));
    let h = Harness::new(Script {
        deferral: Some(deferral.clone()),
        ..Default::default()
    });
    h.session.open(&device()).unwrap();
    assert!(deferral.is_pending());

    assert!(h.session.release_for_suspend(&deferral));

    assert_eq!(h.script.lock().unwrap().pending_at_release, vec![true]);
    assert!(!deferral.is_pending());
    assert_eq!(h.releases(), 1);
    assert_eq!(h.uninhibits(), 1);
    assert_eq!(h.session.state(), SessionState::Closed);
}

#[test]
fn test_suspend_while_blocked_releases_device() {
    let deferral = SuspendDeferral::new(Some(delay_lock()));
    let h = Harness::new(Script {
        start_results: VecDeque::from([Err(CameraError::DeviceBusy)]),
        deferral: Some(deferral.clone()),
        ..Default::default()
    });
    assert_eq!(h.session.open(&device()), Ok(SessionState::PreviewBlocked));

    assert!(h.session.release_for_suspend(&deferral));
    assert_eq!(h.script.lock().unwrap().pending_at_release, vec![true]);
    assert_eq!(h.keep_alive.active_count(), 0);
}

#[test]
fn test_open_queued_behind_suspend_is_refused() {
    let deferral = SuspendDeferral::new(Some(delay_lock()));
    let h = Harness::new(Script::default());

    // Nothing open yet: the suspend goes ahead right away
    assert!(!h.session.release_for_suspend(&deferral));
    assert!(!deferral.is_pending());
    assert!(h.session.is_suspended());

    assert_eq!(h.session.open(&device()), Err(CameraError::Suspended));
    assert_eq!(h.script.lock().unwrap().opens, 0);
    assert_eq!(h.keep_alive.active_count(), 0);
    assert_eq!(h.session.state(), SessionState::Closed);

    h.session.resume();
    assert!(!h.session.is_suspended());
    assert_eq!(h.session.open(&device()), Ok(SessionState::Previewing));
}

#[test]
fn test_busy_stream_blocks_preview_and_keeps_device() {
    let h = Harness::new(Script::default());
    h.session.open(&device()).unwrap();
    let generation = h.session.generation();

    assert_eq!(h.session.block_preview(), SessionState::PreviewBlocked);

    assert_eq!(h.session.state(), SessionState::PreviewBlocked);
    assert!(h.script.lock().unwrap().is_open);
    assert_eq!(h.script.lock().unwrap().stops, 1);
    assert_eq!(h.releases(), 0);
    assert_eq!(h.keep_alive.active_count(), 1);
    assert!(h.session.take_preview_stream().is_none());

    // Access freed: the retry starts a fresh stream
    assert_eq!(h.session.retry_preview(), Ok(SessionState::Previewing));
    assert!(h.session.generation() > generation);
    assert!(h.session.take_preview_stream().is_some());
}

#[test]
fn test_block_preview_outside_previewing_is_noop() {
    let h = Harness::new(Script::default());
    assert_eq!(h.session.block_preview(), SessionState::Closed);

    let h = Harness::new(Script {
        start_results: VecDeque::from([Err(CameraError::DeviceBusy)]),
        ..Default::default()
    });
    h.session.open(&device()).unwrap();
    assert_eq!(h.session.block_preview(), SessionState::PreviewBlocked);
    assert_eq!(h.script.lock().unwrap().stops, 0);
}

#[test]
fn test_open_finished_after_leaving_page_releases_once() {
    let h = Harness::new(Script::default());
    // The open job completes after the user already navigated back
    assert_eq!(h.session.open(&device()), Ok(SessionState::Previewing));
    assert!(h.session.close());

    assert_eq!(h.releases(), 1);
    assert_eq!(h.uninhibits(), 1);
    assert_eq!(h.keep_alive.active_count(), 0);
}
