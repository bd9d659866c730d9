// SPDX-License-Identifier: GPL-3.0-only

//! Camera session handlers
//!
//! Session operations block (pipeline state changes wait on the device), so
//! each one runs on the blocking pool and reports back with a message. The
//! session serializes them internally.

use crate::app::state::{AppModel, Message, Page};
use crate::backends::camera::enumeration::{enumerate_cameras, preferred_index};
use crate::backends::camera::types::{CameraDevice, CameraFrame};
use crate::backends::camera::SessionState;
use crate::constants::timing;
use crate::errors::CameraError;
use crate::fl;
use cosmic::Task;
use cosmic::cosmic_config::CosmicConfigEntry;
use cosmic::widget::image::Handle;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Text shown in the error banner for a camera error
pub fn camera_error_text(error: &CameraError) -> String {
    match error {
        CameraError::AccessDenied => fl!("error-access-denied"),
        CameraError::DeviceBusy => fl!("error-device-busy"),
        CameraError::NoCameraFound => fl!("error-no-camera"),
        other => fl!("error-camera-failed", reason = other.to_string()),
    }
}

/// Flip packed RGBA rows horizontally in place
pub fn mirror_rgba(pixels: &mut [u8], width: u32) {
    let row_bytes = width as usize * 4;
    if row_bytes == 0 {
        return;
    }
    for row in pixels.chunks_exact_mut(row_bytes) {
        let (mut left, mut right) = (0, width as usize - 1);
        while left < right {
            for channel in 0..4 {
                row.swap(left * 4 + channel, right * 4 + channel);
            }
            left += 1;
            right -= 1;
        }
    }
}

/// What to do with a session whose open just finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenedSession {
    /// Capture page still shown: adopt the result
    Keep,
    /// Capture page left while the device was being acquired
    Release,
    /// A suspend arrived meanwhile and already released or refused the device
    Discard,
}

pub(crate) fn opened_session(page: Page, suspending: bool) -> OpenedSession {
    if page != Page::Capture {
        OpenedSession::Release
    } else if suspending {
        OpenedSession::Discard
    } else {
        OpenedSession::Keep
    }
}

/// Run `op` on the blocking pool; a panicked job counts as a device failure
async fn blocking<T, F>(op: F) -> Result<T, CameraError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CameraError> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .unwrap_or_else(|e| Err(CameraError::DeviceFailed(format!("Camera task failed: {}", e))))
}

impl AppModel {
    /// Open the session for the capture page, enumerating cameras first if needed
    pub(crate) fn start_session(&mut self) -> Task<cosmic::Action<Message>> {
        if self.opening || self.session_state.is_open() {
            debug!(state = ?self.session_state, "Session already open or opening");
            return Task::none();
        }
        if self.suspending {
            self.reopen_on_resume = self.page == Page::Capture;
            debug!("Deferring camera open until resume");
            return Task::none();
        }
        self.opening = true;

        if self.available_cameras.is_empty() {
            info!("Enumerating cameras asynchronously");
            return Task::perform(blocking(enumerate_cameras), |result| {
                cosmic::Action::App(Message::CamerasLoaded(result))
            });
        }
        self.open_selected_camera()
    }

    fn open_selected_camera(&mut self) -> Task<cosmic::Action<Message>> {
        let Some(device) = self
            .available_cameras
            .get(self.current_camera_index)
            .cloned()
        else {
            self.opening = false;
            self.error = Some(camera_error_text(&CameraError::NoCameraFound));
            return Task::none();
        };

        info!(device = %device, "Opening camera");
        let session = self.session.clone();
        Task::perform(blocking(move || session.open(&device)), |result| {
            cosmic::Action::App(Message::SessionOpened(result))
        })
    }

    /// Close and reopen on `device` in one blocking job
    pub(crate) fn reopen_session(&mut self, device: CameraDevice) -> Task<cosmic::Action<Message>> {
        self.opening = true;
        self.session_state = SessionState::Closed;
        self.preview = None;
        let session = self.session.clone();
        Task::perform(
            blocking(move || {
                session.close();
                session.open(&device)
            }),
            |result| cosmic::Action::App(Message::SessionOpened(result)),
        )
    }

    /// Release the session off the UI thread
    pub(crate) fn close_session(&mut self) -> Task<cosmic::Action<Message>> {
        self.session_state = SessionState::Closed;
        self.preview = None;
        self.retrying = false;
        let session = self.session.clone();
        Task::perform(
            async move {
                let _ = blocking(move || Ok(session.close())).await;
            },
            |_| cosmic::Action::App(Message::SessionClosed),
        )
    }

    pub(crate) fn handle_cameras_loaded(
        &mut self,
        result: Result<Vec<CameraDevice>, CameraError>,
    ) -> Task<cosmic::Action<Message>> {
        match result {
            Ok(cameras) => {
                info!(count = cameras.len(), "Cameras loaded");
                self.current_camera_index =
                    preferred_index(&cameras, self.config.last_camera_id.as_deref());
                self.camera_dropdown_options = cameras.iter().map(|c| c.name.clone()).collect();
                self.available_cameras = cameras;

                if self.opening && self.page == Page::Capture {
                    return self.open_selected_camera();
                }
            }
            Err(e) => {
                error!(error = %e, "Camera enumeration failed");
                if self.page == Page::Capture {
                    self.error = Some(camera_error_text(&e));
                }
            }
        }
        self.opening = false;
        Task::none()
    }

    pub(crate) fn handle_session_opened(
        &mut self,
        result: Result<SessionState, CameraError>,
    ) -> Task<cosmic::Action<Message>> {
        self.opening = false;

        match opened_session(self.page, self.suspending) {
            OpenedSession::Keep => {}
            OpenedSession::Release => {
                info!("Capture page left during open, releasing camera");
                return self.close_session();
            }
            OpenedSession::Discard => {
                debug!(?result, "Open finished during suspend, result discarded");
                self.session_state = SessionState::Closed;
                return Task::none();
            }
        }

        match result {
            Ok(state) => {
                self.session_state = state;
                self.preview_generation = self.session.generation();
                self.preview_frames = 0;
                info!(?state, generation = self.preview_generation, "Camera session opened");

                if state == SessionState::PreviewBlocked {
                    self.error = Some(camera_error_text(&CameraError::DeviceBusy));
                }
                self.remember_camera();
            }
            Err(e) => {
                warn!(error = %e, "Camera session could not be opened");
                self.session_state = SessionState::Closed;
                self.error = Some(camera_error_text(&e));
            }
        }
        Task::none()
    }

    fn remember_camera(&mut self) {
        let Some(camera) = self.available_cameras.get(self.current_camera_index) else {
            return;
        };
        let id = camera.id();
        if self.config.last_camera_id.as_deref() == Some(id.as_str()) {
            return;
        }
        self.config.last_camera_id = Some(id);
        if let Some(handler) = self.config_handler.as_ref()
            && let Err(err) = self.config.write_entry(handler)
        {
            error!(?err, "Failed to save camera selection");
        }
    }

    pub(crate) fn handle_preview_frame(
        &mut self,
        frame: Arc<CameraFrame>,
    ) -> Task<cosmic::Action<Message>> {
        if self.page != Page::Capture || self.session_state != SessionState::Previewing {
            return Task::none();
        }

        self.preview_frames += 1;
        if self.preview_frames % timing::FRAME_LOG_INTERVAL == 1 {
            debug!(
                frame = self.preview_frames,
                width = frame.width,
                height = frame.height,
                latency_ms = frame.captured_at.elapsed().as_secs_f64() * 1000.0,
                "Preview frame"
            );
        }

        let mut pixels = frame.packed_rgba();
        if self.config.mirror_preview {
            mirror_rgba(&mut pixels, frame.width);
        }
        self.preview = Some(Handle::from_rgba(frame.width, frame.height, pixels));
        Task::none()
    }

    pub(crate) fn handle_camera_failed(
        &mut self,
        error: CameraError,
    ) -> Task<cosmic::Action<Message>> {
        if !self.session_state.is_open() {
            return Task::none();
        }
        let session = self.session.clone();

        // Exclusive access taken after the stream started: wait, keep the device
        if error == CameraError::DeviceBusy && self.session_state == SessionState::Previewing {
            warn!("Camera taken by another application, waiting for it");
            self.error = Some(camera_error_text(&error));
            self.session_state = SessionState::PreviewBlocked;
            self.preview = None;
            // Holds off the retry timer until the stream is stopped
            self.retrying = true;
            return Task::perform(blocking(move || Ok(session.block_preview())), |result| {
                cosmic::Action::App(Message::PreviewRetried(result))
            });
        }

        error!(error = %error, "Camera stopped working");
        self.error = Some(camera_error_text(&error));
        self.session_state = SessionState::Closed;
        self.preview = None;

        Task::perform(
            async move {
                if let Err(e) = tokio::task::spawn_blocking(move || session.fail(error)).await {
                    error!(error = %e, "Camera release task failed");
                }
            },
            |_| cosmic::Action::App(Message::SessionClosed),
        )
    }

    pub(crate) fn handle_retry_preview(&mut self) -> Task<cosmic::Action<Message>> {
        if self.retrying || self.session_state != SessionState::PreviewBlocked {
            return Task::none();
        }
        self.retrying = true;
        let session = self.session.clone();
        Task::perform(blocking(move || session.retry_preview()), |result| {
            cosmic::Action::App(Message::PreviewRetried(result))
        })
    }

    pub(crate) fn handle_preview_retried(
        &mut self,
        result: Result<SessionState, CameraError>,
    ) -> Task<cosmic::Action<Message>> {
        self.retrying = false;
        if self.page != Page::Capture || !self.session_state.is_open() {
            return Task::none();
        }

        match result {
            Ok(SessionState::Previewing) => {
                info!("Exclusive access released, preview started");
                self.session_state = SessionState::Previewing;
                self.preview_generation = self.session.generation();
                self.preview_frames = 0;
                self.error = None;
            }
            Ok(SessionState::PreviewBlocked) => {
                debug!("Preview still blocked");
                self.session_state = SessionState::PreviewBlocked;
            }
            Ok(state) => self.session_state = state,
            Err(e) => {
                warn!(error = %e, "Preview retry failed");
                self.session_state = SessionState::Closed;
                self.error = Some(camera_error_text(&e));
            }
        }
        Task::none()
    }

    pub(crate) fn handle_session_closed(&mut self) -> Task<cosmic::Action<Message>> {
        debug!("Camera session released");
        Task::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_swaps_pixels_per_row() {
        let mut pixels = vec![
            1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, //
            4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6,
        ];
        mirror_rgba(&mut pixels, 3);
        assert_eq!(
            pixels,
            vec![
                3, 3, 3, 3, 2, 2, 2, 2, 1, 1, 1, 1, //
                6, 6, 6, 6, 5, 5, 5, 5, 4, 4, 4, 4,
            ]
        );
    }

    #[test]
    fn mirror_handles_degenerate_sizes() {
        let mut empty: Vec<u8> = Vec::new();
        mirror_rgba(&mut empty, 0);
        let mut single = vec![9, 8, 7, 6];
        mirror_rgba(&mut single, 1);
        assert_eq!(single, vec![9, 8, 7, 6]);
    }

    #[test]
    fn open_result_follows_page_and_suspend() {
        assert_eq!(opened_session(Page::Capture, false), OpenedSession::Keep);
        // Back navigation while the open was in flight
        assert_eq!(opened_session(Page::Gallery, false), OpenedSession::Release);
        assert_eq!(opened_session(Page::Gallery, true), OpenedSession::Release);
        // Suspend already took care of the device
        assert_eq!(opened_session(Page::Capture, true), OpenedSession::Discard);
    }

    #[test]
    fn error_texts() {
        assert_eq!(
            camera_error_text(&CameraError::AccessDenied),
            "The app was denied access to the camera"
        );
        assert!(camera_error_text(&CameraError::DeviceFailed("gone".into())).contains("gone"));
    }
}
