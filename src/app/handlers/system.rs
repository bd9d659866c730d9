// SPDX-License-Identifier: GPL-3.0-only

//! Navigation, settings and system event handlers

use crate::app::photo_library;
use crate::app::state::{AppModel, ContextPage, Message, Page};
use crate::backends::camera::SessionState;
use crate::config::{AppTheme, Config};
use crate::pipelines::photo::PhotoPipeline;
use crate::power::{SleepEvent, SuspendDeferral};
use cosmic::Task;
use cosmic::cosmic_config::CosmicConfigEntry;
use tracing::{error, info};

impl AppModel {
    pub(crate) fn handle_launch_url(&self, url: String) -> Task<cosmic::Action<Message>> {
        if let Err(err) = open::that_detached(&url) {
            error!(url = %url, error = %err, "Failed to open URL");
        }
        Task::none()
    }

    pub(crate) fn handle_toggle_context_page(
        &mut self,
        context_page: ContextPage,
    ) -> Task<cosmic::Action<Message>> {
        if self.context_page == context_page {
            self.core.window.show_context = !self.core.window.show_context;
        } else {
            self.context_page = context_page;
            self.core.window.show_context = true;
        }
        Task::none()
    }

    pub(crate) fn handle_open_capture(&mut self) -> Task<cosmic::Action<Message>> {
        if self.page == Page::Capture {
            return Task::none();
        }
        info!("Entering capture page");
        self.page = Page::Capture;
        self.error = None;
        self.preview = None;
        if self.suspending {
            // The page was left mid-suspend, so no resume notice reached us
            self.reopen_on_resume = true;
            return self.resume_session();
        }
        self.reopen_on_resume = false;
        self.start_session()
    }

    pub(crate) fn handle_back_to_gallery(&mut self) -> Task<cosmic::Action<Message>> {
        if self.page == Page::Gallery {
            return Task::none();
        }
        info!("Leaving capture page");
        self.page = Page::Gallery;
        self.error = None;
        self.reopen_on_resume = false;
        Task::batch([
            self.close_session(),
            Task::done(cosmic::Action::App(Message::RefreshGallery)),
        ])
    }

    fn save_config(&self, what: &str) {
        if let Some(handler) = self.config_handler.as_ref()
            && let Err(err) = self.config.write_entry(handler)
        {
            error!(?err, setting = what, "Failed to save setting");
        }
    }

    pub(crate) fn handle_update_config(&mut self, config: Config) -> Task<cosmic::Action<Message>> {
        info!("UpdateConfig received");
        let folder_changed = config.effective_folder_name() != self.config.effective_folder_name();
        self.photo_pipeline = PhotoPipeline::with_quality(config.effective_jpeg_quality());
        self.config = config;

        if folder_changed {
            self.library = photo_library(self.config.effective_folder_name());
            info!(path = %self.library.dir().display(), "Photo folder changed");
            return Task::done(cosmic::Action::App(Message::RefreshGallery));
        }
        Task::none()
    }

    pub(crate) fn handle_set_app_theme(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let Some(app_theme) = AppTheme::ALL.get(index).copied() else {
            return Task::none();
        };

        info!(?app_theme, "Setting application theme");
        self.config.app_theme = app_theme;
        self.save_config("app_theme");

        cosmic::command::set_theme(app_theme.theme())
    }

    pub(crate) fn handle_select_camera(&mut self, index: usize) -> Task<cosmic::Action<Message>> {
        let Some(device) = self.available_cameras.get(index).cloned() else {
            return Task::none();
        };
        if index == self.current_camera_index {
            return Task::none();
        }
        info!(index, device = %device, "Selected camera");
        self.current_camera_index = index;
        self.config.last_camera_id = Some(device.id());
        self.save_config("last_camera_id");

        if self.page == Page::Capture && !self.opening {
            return self.reopen_session(device);
        }
        Task::none()
    }

    pub(crate) fn handle_toggle_mirror_preview(&mut self) -> Task<cosmic::Action<Message>> {
        self.config.mirror_preview = !self.config.mirror_preview;
        info!(mirror = self.config.mirror_preview, "Mirror preview toggled");
        self.save_config("mirror_preview");
        Task::none()
    }

    pub(crate) fn handle_set_jpeg_quality(&mut self, quality: u8) -> Task<cosmic::Action<Message>> {
        self.config.jpeg_quality = quality;
        self.photo_pipeline = PhotoPipeline::with_quality(self.config.effective_jpeg_quality());
        self.save_config("jpeg_quality");
        Task::none()
    }

    /// Suspend: cancel any pending open, release the camera, then let the
    /// suspend proceed. Resume: reopen if the capture page is still shown.
    pub(crate) fn handle_sleep(&mut self, event: SleepEvent) -> Task<cosmic::Action<Message>> {
        match event {
            SleepEvent::Suspending(deferral) => {
                let had_camera = self.session_state.is_open() || self.opening;
                self.reopen_on_resume = had_camera && self.page == Page::Capture;
                if had_camera {
                    info!("Releasing camera before suspend");
                }
                self.release_for_suspend(deferral)
            }
            SleepEvent::Resumed => {
                info!("System resumed");
                self.resume_session()
            }
        }
    }

    fn release_for_suspend(&mut self, deferral: SuspendDeferral) -> Task<cosmic::Action<Message>> {
        // Results of opens still in flight are discarded until resume
        self.suspending = true;
        self.opening = false;
        self.session_state = SessionState::Closed;
        self.preview = None;
        self.retrying = false;
        let session = self.session.clone();
        Task::perform(
            async move {
                let result = tokio::task::spawn_blocking(move || {
                    session.release_for_suspend(&deferral)
                })
                .await;
                if let Err(e) = result {
                    error!(error = %e, "Suspend cleanup task failed");
                }
            },
            |_| cosmic::Action::App(Message::SuspendCleanupDone),
        )
    }

    /// Lift the suspend gate on the session off the UI thread
    pub(crate) fn resume_session(&mut self) -> Task<cosmic::Action<Message>> {
        self.suspending = false;
        let session = self.session.clone();
        Task::perform(
            async move {
                if let Err(e) = tokio::task::spawn_blocking(move || session.resume()).await {
                    error!(error = %e, "Resume task failed");
                }
            },
            |_| cosmic::Action::App(Message::SessionResumed),
        )
    }

    pub(crate) fn handle_session_resumed(&mut self) -> Task<cosmic::Action<Message>> {
        if self.reopen_on_resume && self.page == Page::Capture && !self.suspending {
            self.reopen_on_resume = false;
            info!("Reopening camera after resume");
            return self.start_session();
        }
        Task::none()
    }

    /// Release synchronously; the window is about to go away
    pub(crate) fn handle_window_close_requested(&mut self) -> Task<cosmic::Action<Message>> {
        if self.session.close() {
            info!("Camera released on window close");
        }
        self.session_state = SessionState::Closed;
        Task::none()
    }
}
