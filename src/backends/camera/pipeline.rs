// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer camera backend
//!
//! One pipeline per open device:
//!
//! ```text
//! pipewiresrc | v4l2src | autovideosrc ! videoconvert ! videoscale ! video/x-raw,format=RGBA ! appsink
//! ```
//!
//! `open` brings the pipeline to READY, which is where the device node (or
//! PipeWire node) is opened. `start_preview` brings it to PLAYING, which is
//! where a device held exclusively by another process refuses to stream.
//! v4l2src often only finds out at STREAMON, after PLAYING was reached; that
//! busy error arrives through the bus watch instead of `start_preview`.

use super::types::*;
use super::{CameraBackend, portal};
use crate::constants::{pipeline, timing};
use crate::errors::CameraError;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::os::fd::{AsRawFd, OwnedFd};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

type LatestFrame = Arc<Mutex<Option<Arc<CameraFrame>>>>;

/// An opened device: pipeline in READY plus whatever keeps it reachable
struct OpenPipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    /// Portal-provided PipeWire remote (sandboxed builds only)
    _remote: Option<OwnedFd>,
}

/// GStreamer backend
#[derive(Default)]
pub struct GStreamerBackend {
    open: Option<OpenPipeline>,
    latest: LatestFrame,
    streaming: bool,
    /// Cleared to stop the bus watch of the current preview
    watching: Arc<AtomicBool>,
}

impl GStreamerBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CameraBackend for GStreamerBackend {
    fn open(&mut self, device: &CameraDevice) -> BackendResult<()> {
        if self.open.is_some() {
            return Err(CameraError::AlreadyOpen);
        }
        gstreamer::init().map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

        let remote = if portal::is_sandboxed() && !matches!(device.source, DeviceSource::V4l2 { .. })
        {
            Some(portal::request_camera_remote()?)
        } else {
            None
        };

        let description = pipeline_description(
            &device.source,
            remote.as_ref().map(|fd| fd.as_raw_fd()),
        );
        info!(device = %device, pipeline = %description, "Creating camera pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CameraError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| {
                CameraError::InitializationFailed("Parsed element is not a pipeline".to_string())
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| {
                CameraError::InitializationFailed("Failed to cast appsink".to_string())
            })?;
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        // READY opens the device; permission problems surface here
        if pipeline.set_state(gstreamer::State::Ready).is_err() {
            let err = take_bus_error(&pipeline)
                .unwrap_or_else(|| CameraError::InitializationFailed("Device open failed".into()));
            let _ = pipeline.set_state(gstreamer::State::Null);
            error!(error = %err, "Failed to open camera");
            return Err(err);
        }

        self.open = Some(OpenPipeline {
            pipeline,
            appsink,
            _remote: remote,
        });
        Ok(())
    }

    fn start_preview(&mut self) -> BackendResult<PreviewStream> {
        let open = self.open.as_ref().ok_or(CameraError::NotPreviewing)?;
        let (frame_tx, failure_tx, stream) =
            PreviewStream::channel(pipeline::FRAME_CHANNEL_CAPACITY);

        install_frame_callback(&open.appsink, frame_tx, Arc::clone(&self.latest));
        // Errors left over from an earlier attempt must not reach the new watch
        flush_bus(&open.pipeline);

        let started = open.pipeline.set_state(gstreamer::State::Playing).is_ok() && {
            let (result, state, _) = open.pipeline.state(gstreamer::ClockTime::from_seconds(
                timing::START_TIMEOUT_SECS,
            ));
            debug!(result = ?result, state = ?state, "Pipeline state after start");
            result.is_ok()
        };

        if !started {
            let err = take_bus_error(&open.pipeline)
                .unwrap_or_else(|| CameraError::DeviceFailed("Preview did not start".into()));
            open.appsink
                .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
            let _ = open.pipeline.set_state(gstreamer::State::Ready);
            warn!(error = %err, "Preview failed to start");
            return Err(err);
        }

        self.watching = Arc::new(AtomicBool::new(true));
        spawn_bus_watch(&open.pipeline, failure_tx, Arc::clone(&self.watching));
        self.streaming = true;
        info!("Camera preview started");
        Ok(stream)
    }

    fn stop_preview(&mut self) -> BackendResult<()> {
        let Some(open) = self.open.as_ref() else {
            return Ok(());
        };
        if !self.streaming {
            return Ok(());
        }
        self.streaming = false;
        self.watching.store(false, Ordering::Release);

        open.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        open.pipeline
            .set_state(gstreamer::State::Ready)
            .map_err(|e| CameraError::DeviceFailed(format!("Failed to stop preview: {}", e)))?;
        flush_bus(&open.pipeline);
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Camera preview stopped");
        Ok(())
    }

    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn release(&mut self) {
        self.streaming = false;
        self.watching.store(false, Ordering::Release);
        if let Some(open) = self.open.take() {
            shutdown(open);
        }
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

impl Drop for GStreamerBackend {
    fn drop(&mut self) {
        self.release();
    }
}

/// Source element for a device, plus the shared conversion tail
pub fn pipeline_description(source: &DeviceSource, portal_fd: Option<i32>) -> String {
    let src = match source {
        DeviceSource::PipeWire { target } => match portal_fd {
            Some(fd) => format!("pipewiresrc fd={} target-object=\"{}\"", fd, target),
            None => format!("pipewiresrc target-object=\"{}\"", target),
        },
        DeviceSource::V4l2 { path } => format!("v4l2src device=\"{}\"", path),
        DeviceSource::Auto => match portal_fd {
            Some(fd) => format!("pipewiresrc fd={}", fd),
            None => "autovideosrc".to_string(),
        },
    };
    format!(
        "{} ! videoconvert ! videoscale ! video/x-raw,format=RGBA ! appsink name=sink",
        src
    )
}

/// Map a GStreamer error message onto the camera error kinds the UI knows
pub fn classify_error(err: &gstreamer::glib::Error, debug_info: Option<&str>) -> CameraError {
    use gstreamer::ResourceError;

    let permission_text = |s: &str| {
        let s = s.to_ascii_lowercase();
        s.contains("permission denied") || s.contains("not permitted")
    };
    let busy_text = |s: &str| s.to_ascii_lowercase().contains("busy");

    match err.kind::<ResourceError>() {
        Some(ResourceError::Busy) => CameraError::DeviceBusy,
        Some(ResourceError::NotAuthorized) => CameraError::AccessDenied,
        Some(ResourceError::OpenRead | ResourceError::OpenReadWrite | ResourceError::OpenWrite)
            if debug_info.is_some_and(permission_text) || permission_text(err.message()) =>
        {
            CameraError::AccessDenied
        }
        // v4l2src reports EBUSY during STREAMON as a generic failure
        _ if debug_info.is_some_and(busy_text) || busy_text(err.message()) => {
            CameraError::DeviceBusy
        }
        _ => CameraError::DeviceFailed(err.message().to_string()),
    }
}

fn take_bus_error(pipeline: &gstreamer::Pipeline) -> Option<CameraError> {
    let bus = pipeline.bus()?;
    let message = bus.pop_filtered(&[gstreamer::MessageType::Error])?;
    match message.view() {
        gstreamer::MessageView::Error(err) => {
            let debug_info = err.debug().map(|d| d.to_string());
            debug!(error = %err.error(), debug = ?debug_info, "Pipeline error");
            Some(classify_error(&err.error(), debug_info.as_deref()))
        }
        _ => None,
    }
}

/// Drop every queued bus message
fn flush_bus(pipeline: &gstreamer::Pipeline) {
    if let Some(bus) = pipeline.bus() {
        bus.set_flushing(true);
        bus.set_flushing(false);
    }
}

/// Forward runtime errors (device unplugged, driver failure) to the session owner
fn spawn_bus_watch(
    pipeline: &gstreamer::Pipeline,
    failure_tx: futures::channel::mpsc::UnboundedSender<CameraError>,
    watching: Arc<AtomicBool>,
) {
    let Some(bus) = pipeline.bus() else {
        return;
    };
    std::thread::spawn(move || {
        while watching.load(Ordering::Acquire) {
            let Some(message) = bus.timed_pop_filtered(
                gstreamer::ClockTime::from_mseconds(250),
                &[gstreamer::MessageType::Error, gstreamer::MessageType::Eos],
            ) else {
                if failure_tx.is_closed() {
                    break;
                }
                continue;
            };
            if !watching.load(Ordering::Acquire) {
                break;
            }
            // Stop after the first failure; the rest of the burst is flushed
            // before the next start

            let failure = match message.view() {
                gstreamer::MessageView::Error(err) => {
                    let debug_info = err.debug().map(|d| d.to_string());
                    classify_error(&err.error(), debug_info.as_deref())
                }
                _ => CameraError::DeviceFailed("Camera stream ended".to_string()),
            };
            error!(error = %failure, "Camera pipeline failure");
            let _ = failure_tx.unbounded_send(failure);
            break;
        }
        debug!("Bus watch stopped");
    });
}

fn install_frame_callback(appsink: &AppSink, frame_sender: FrameSender, latest: LatestFrame) {
    appsink.set_callbacks(
        gstreamer_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);

                let sample = appsink
                    .pull_sample()
                    .map_err(|_| gstreamer::FlowError::Eos)?;
                let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
                    return Ok(gstreamer::FlowSuccess::Ok);
                }
                let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                let video_info =
                    VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                let map = buffer
                    .map_readable()
                    .map_err(|_| gstreamer::FlowError::Error)?;

                let frame = Arc::new(CameraFrame {
                    width: video_info.width(),
                    height: video_info.height(),
                    stride: video_info.stride()[0] as u32,
                    data: Arc::from(map.as_slice()),
                    captured_at: Instant::now(),
                });

                *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&frame));

                // Preview can skip frames; capture always reads `latest`
                let _ = frame_sender.clone().try_send((*frame).clone());

                if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        frame = frame_num,
                        width = frame.width,
                        height = frame.height,
                        "Frame delivered"
                    );
                }
                Ok(gstreamer::FlowSuccess::Ok)
            })
            .build(),
    );
}

fn shutdown(open: OpenPipeline) {
    info!("Releasing camera pipeline");
    open.appsink
        .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
    if let Err(e) = open.pipeline.set_state(gstreamer::State::Null) {
        warn!(error = %e, "Failed to set pipeline to NULL");
    }
    let (result, state, _) = open
        .pipeline
        .state(gstreamer::ClockTime::from_seconds(timing::STOP_TIMEOUT_SECS));
    debug!(result = ?result, state = ?state, "Camera pipeline released");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipewire_description_with_portal_fd() {
        let desc = pipeline_description(
            &DeviceSource::PipeWire {
                target: "57".into(),
            },
            Some(12),
        );
        assert!(desc.starts_with("pipewiresrc fd=12 target-object=\"57\""));
        assert!(desc.ends_with("appsink name=sink"));
    }

    #[test]
    fn v4l2_description() {
        let desc = pipeline_description(
            &DeviceSource::V4l2 {
                path: "/dev/video0".into(),
            },
            None,
        );
        assert!(desc.starts_with("v4l2src device=\"/dev/video0\""));
        assert!(desc.contains("format=RGBA"));
    }

    #[test]
    fn classify_resource_errors() {
        use gstreamer::ResourceError;
        let busy = gstreamer::glib::Error::new(ResourceError::Busy, "Device is busy");
        assert_eq!(classify_error(&busy, None), CameraError::DeviceBusy);

        let denied = gstreamer::glib::Error::new(ResourceError::OpenReadWrite, "Could not open");
        assert_eq!(
            classify_error(&denied, Some("system error: Permission denied")),
            CameraError::AccessDenied
        );

        let streamon = gstreamer::glib::Error::new(ResourceError::Failed, "Failed to start");
        assert_eq!(
            classify_error(&streamon, Some("STREAMON: Device or resource busy")),
            CameraError::DeviceBusy
        );

        let other = gstreamer::glib::Error::new(ResourceError::Read, "read failed");
        assert!(matches!(
            classify_error(&other, None),
            CameraError::DeviceFailed(_)
        ));
    }
}
