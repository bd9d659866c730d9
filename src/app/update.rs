// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The main `update()` function acts as a dispatcher; the handling code lives
//! in the `handlers` submodules, organized by functional domain.
//!
//! # Handler Modules
//!
//! - `handlers::camera`: enumeration, session open/close, preview, retry, failures
//! - `handlers::capture`: still capture and save
//! - `handlers::gallery`: listing, deletion, opening the folder
//! - `handlers::system`: navigation, settings, suspend and window close

use crate::app::state::{AppModel, Message};
use cosmic::Task;

impl AppModel {
    /// Main message handler - routes messages to appropriate handler methods.
    pub fn update(&mut self, message: Message) -> Task<cosmic::Action<Message>> {
        match message {
            // ===== UI Navigation =====
            Message::LaunchUrl(url) => self.handle_launch_url(url),
            Message::ToggleContextPage(page) => self.handle_toggle_context_page(page),
            Message::OpenCapture => self.handle_open_capture(),
            Message::BackToGallery => self.handle_back_to_gallery(),
            Message::DismissError => {
                self.error = None;
                Task::none()
            }

            // ===== Camera =====
            Message::CamerasLoaded(result) => self.handle_cameras_loaded(result),
            Message::SessionOpened(result) => self.handle_session_opened(result),
            Message::PreviewFrame(frame) => self.handle_preview_frame(frame),
            Message::CameraFailed(error) => self.handle_camera_failed(error),
            Message::RetryPreview => self.handle_retry_preview(),
            Message::PreviewRetried(result) => self.handle_preview_retried(result),
            Message::SessionClosed => self.handle_session_closed(),

            // ===== Capture =====
            Message::Capture => self.handle_capture(),
            Message::PhotoSaved(result) => self.handle_photo_saved(result),

            // ===== Gallery =====
            Message::RefreshGallery => self.handle_refresh_gallery(),
            Message::GalleryLoaded(generation, result) => {
                self.handle_gallery_loaded(generation, result)
            }
            Message::DeletePhoto(name) => self.handle_delete_photo(name),
            Message::PhotoDeleted(result) => self.handle_photo_deleted(result),
            Message::OpenFolder => self.handle_open_folder(),

            // ===== Settings =====
            Message::UpdateConfig(config) => self.handle_update_config(config),
            Message::SetAppTheme(index) => self.handle_set_app_theme(index),
            Message::SelectCamera(index) => self.handle_select_camera(index),
            Message::ToggleMirrorPreview => self.handle_toggle_mirror_preview(),
            Message::SetJpegQuality(quality) => self.handle_set_jpeg_quality(quality),

            // ===== System =====
            Message::Sleep(event) => self.handle_sleep(event),
            Message::SuspendCleanupDone => Task::none(),
            Message::SessionResumed => self.handle_session_resumed(),
            Message::WindowCloseRequested => self.handle_window_close_requested(),

            Message::Noop => Task::none(),
        }
    }
}
