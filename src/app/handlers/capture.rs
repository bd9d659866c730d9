// SPDX-License-Identifier: GPL-3.0-only

//! Capture operation handlers
//!
//! Capture grabs the newest preview frame, so the preview never pauses;
//! encoding and disk I/O run in the photo pipeline off the UI thread.

use crate::app::state::{AppModel, Message, Page};
use crate::backends::camera::SessionState;
use crate::errors::AppError;
use crate::fl;
use cosmic::Task;
use std::path::PathBuf;
use tracing::{error, info};

impl AppModel {
    pub(crate) fn handle_capture(&mut self) -> Task<cosmic::Action<Message>> {
        if self.is_capturing || self.session_state != SessionState::Previewing {
            return Task::none();
        }
        info!("Capturing photo");
        self.is_capturing = true;

        let session = self.session.clone();
        let library = self.library.clone();
        let pipeline = self.photo_pipeline;

        Task::perform(
            async move {
                let frame = tokio::task::spawn_blocking(move || session.capture_still())
                    .await
                    .map_err(|e| e.to_string())?
                    .map_err(AppError::from)
                    .map_err(|e| e.to_string())?;
                pipeline
                    .capture_and_save(frame, library)
                    .await
                    .map_err(|e| e.to_string())
            },
            |result| cosmic::Action::App(Message::PhotoSaved(result)),
        )
    }

    /// A saved photo ends the capture page: release the camera, show the gallery
    pub(crate) fn handle_photo_saved(
        &mut self,
        result: Result<PathBuf, String>,
    ) -> Task<cosmic::Action<Message>> {
        self.is_capturing = false;
        match result {
            Ok(path) => {
                info!(path = %path.display(), "Photo saved successfully");
                if self.page != Page::Capture {
                    return Task::done(cosmic::Action::App(Message::RefreshGallery));
                }
                self.page = Page::Gallery;
                Task::batch([
                    self.close_session(),
                    Task::done(cosmic::Action::App(Message::RefreshGallery)),
                ])
            }
            Err(err) => {
                error!(error = %err, "Failed to save photo");
                self.error = Some(fl!("error-save-failed", reason = err));
                Task::none()
            }
        }
    }
}
