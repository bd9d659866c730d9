// SPDX-License-Identifier: GPL-3.0-only

//! Main application module
//!
//! # Architecture
//!
//! - `state`: Application state types (AppModel, Message, Page)
//! - `view`: Page switch and error banner
//! - `gallery_page`: Thumbnails with delete buttons, "Take photo"
//! - `capture_page`: Live preview and capture button
//! - `settings`: Settings drawer UI
//! - `update`: Message dispatch into `handlers`
//!
//! The capture page owns the camera session. It is opened when the page is
//! entered and closed on every way out: back navigation, a completed capture,
//! a device failure, system suspend and window close.

mod capture_page;
mod gallery_page;
pub mod handlers;
mod settings;
mod state;
mod update;
mod view;

pub use state::{AppModel, ContextPage, GalleryRow, GalleryState, Message, Page};

use crate::backends::camera::pipeline::GStreamerBackend;
use crate::backends::camera::{CaptureSession, SessionState};
use crate::config::{AppTheme, Config};
use crate::constants::{DEFAULT_FOLDER_NAME, timing};
use crate::fl;
use crate::pipelines::photo::PhotoPipeline;
use crate::power::{KeepAliveRequest, ScreenSaverInhibitor};
use crate::storage::PhotoLibrary;
use cosmic::app::context_drawer;
use cosmic::iced::Subscription;
use cosmic::widget::{self, about::About};
use cosmic::{Element, Task};
use std::sync::Arc;
use tracing::{error, info, warn};

const REPOSITORY: &str = "https://github.com/jolt-camera/jolt";

/// Output folder for a folder name from config
pub fn photo_library(folder_name: &str) -> PhotoLibrary {
    match PhotoLibrary::in_pictures(folder_name) {
        Ok(library) => library,
        Err(e) => {
            error!(error = %e, "No Pictures directory, using the working directory");
            PhotoLibrary::new(folder_name)
        }
    }
}

impl cosmic::Application for AppModel {
    /// The async executor that will be used to run your application's commands.
    type Executor = cosmic::executor::Default;

    /// Data that your application receives to its init method.
    type Flags = ();

    /// Messages which the application and its widgets will emit.
    type Message = Message;

    /// Unique identifier in RDNN (reverse domain name notation) format.
    const APP_ID: &'static str = "io.github.jolt.Camera";

    fn core(&self) -> &cosmic::Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut cosmic::Core {
        &mut self.core
    }

    /// Initializes the application with any given flags and startup commands.
    fn init(
        core: cosmic::Core,
        _flags: Self::Flags,
    ) -> (Self, Task<cosmic::Action<Self::Message>>) {
        let about = About::default()
            .name(fl!("app-title"))
            .icon(widget::icon::from_name("camera-photo").handle())
            .version(env!("GIT_VERSION"))
            .links([(fl!("repository"), REPOSITORY)])
            .license(env!("CARGO_PKG_LICENSE"));

        let (config_handler, config) = crate::config::load(Self::APP_ID);

        // Required before any GStreamer call
        if let Err(e) = gstreamer::init() {
            error!(error = %e, "Failed to initialize GStreamer");
        }

        let keep_alive = KeepAliveRequest::new(Arc::new(ScreenSaverInhibitor::new(
            fl!("app-title"),
            fl!("keep-alive-reason"),
        )));
        let session = CaptureSession::new(Box::new(GStreamerBackend::new()), keep_alive);

        let library = photo_library(config.effective_folder_name());
        if config.effective_folder_name() != config.folder_name {
            warn!(
                folder = %config.folder_name,
                fallback = DEFAULT_FOLDER_NAME,
                "Unusable folder name in config"
            );
        }
        info!(path = %library.dir().display(), "Photo folder");

        let photo_pipeline = PhotoPipeline::with_quality(config.effective_jpeg_quality());

        let app = AppModel {
            core,
            context_page: ContextPage::default(),
            about,
            config,
            config_handler,
            page: Page::Gallery,
            session,
            session_state: SessionState::Closed,
            preview_generation: 0,
            opening: false,
            retrying: false,
            reopen_on_resume: false,
            suspending: false,
            library,
            photo_pipeline,
            available_cameras: Vec::new(),
            current_camera_index: 0,
            camera_dropdown_options: Vec::new(),
            preview: None,
            preview_frames: 0,
            is_capturing: false,
            gallery: GalleryState::default(),
            error: None,
            theme_dropdown_options: vec![
                fl!("theme-system"),
                fl!("theme-dark"),
                fl!("theme-light"),
            ],
        };

        let theme_task = if app.config.app_theme == AppTheme::System {
            Task::none()
        } else {
            cosmic::command::set_theme(app.config.app_theme.theme())
        };

        // The gallery is the initial page
        (
            app,
            Task::batch([
                theme_task,
                Task::done(cosmic::Action::App(Message::RefreshGallery)),
            ]),
        )
    }

    /// Elements to pack at the end of the header bar.
    fn header_end(&self) -> Vec<Element<'_, Self::Message>> {
        vec![
            widget::button::icon(widget::icon::from_name("help-about-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::About))
                .into(),
            widget::button::icon(widget::icon::from_name("preferences-system-symbolic"))
                .on_press(Message::ToggleContextPage(ContextPage::Settings))
                .into(),
        ]
    }

    /// Display a context drawer if the context page is requested.
    fn context_drawer(&self) -> Option<context_drawer::ContextDrawer<'_, Self::Message>> {
        if !self.core.window.show_context {
            return None;
        }

        Some(match self.context_page {
            ContextPage::About => context_drawer::about(
                &self.about,
                |url| Message::LaunchUrl(url.to_string()),
                Message::ToggleContextPage(ContextPage::About),
            ),
            ContextPage::Settings => self.settings_view(),
        })
    }

    /// Describes the interface based on the current state of the application model.
    fn view(&self) -> Element<'_, Self::Message> {
        self.view()
    }

    /// Release the camera before the window goes away
    fn on_close_requested(&self, _id: cosmic::iced::window::Id) -> Option<Self::Message> {
        Some(Message::WindowCloseRequested)
    }

    /// Register subscriptions for this application.
    fn subscription(&self) -> Subscription<Self::Message> {
        use cosmic::iced::futures::{SinkExt, StreamExt};

        let config_sub = self
            .core()
            .watch_config::<Config>(Self::APP_ID)
            .map(|update| Message::UpdateConfig(update.config));

        if self.page != Page::Capture {
            return config_sub;
        }

        // Keyed on the preview generation: a restarted preview gets a fresh stream
        let preview_sub = if self.session_state == SessionState::Previewing {
            let session = self.session.clone();
            let generation = self.preview_generation;
            Subscription::run_with_id(
                ("camera-preview", generation),
                cosmic::iced::stream::channel(8, move |mut output| async move {
                    let Some(stream) = session.take_preview_stream() else {
                        warn!(generation, "Preview stream already taken");
                        return;
                    };
                    info!(generation, "Preview subscription started");

                    enum Event {
                        Frame(crate::backends::camera::CameraFrame),
                        Failed(crate::errors::CameraError),
                    }
                    let frames = stream.frames.map(Event::Frame);
                    let failures = stream.failures.map(Event::Failed);
                    // Failures first so they are never starved by frames
                    let mut events = cosmic::iced::futures::stream::select(failures, frames);

                    while let Some(event) = events.next().await {
                        match event {
                            Event::Frame(frame) => {
                                // Dropping frames is fine for a live preview
                                if let Err(e) =
                                    output.try_send(Message::PreviewFrame(Arc::new(frame)))
                                    && e.is_disconnected()
                                {
                                    break;
                                }
                            }
                            Event::Failed(err) => {
                                let _ = output.send(Message::CameraFailed(err)).await;
                                break;
                            }
                        }
                    }
                    info!(generation, "Preview subscription ended");
                }),
            )
        } else {
            Subscription::none()
        };

        // No event tells us when another app lets go of the camera, so poll
        let retry_sub = if self.session_state == SessionState::PreviewBlocked {
            Subscription::run_with_id(
                "preview-retry",
                cosmic::iced::stream::channel(1, |mut output| async move {
                    loop {
                        tokio::time::sleep(timing::BLOCKED_RETRY_INTERVAL).await;
                        if output.send(Message::RetryPreview).await.is_err() {
                            break;
                        }
                    }
                }),
            )
        } else {
            Subscription::none()
        };

        // Holds the suspend delay lock while the capture page is shown
        let sleep_sub = Subscription::run_with_id(
            "sleep-watch",
            cosmic::iced::stream::channel(4, crate::power::sleep::watch_sleep),
        )
        .map(Message::Sleep);

        Subscription::batch([config_sub, preview_sub, retry_sub, sleep_sub])
    }

    /// Handles messages emitted by the application and its widgets.
    fn update(&mut self, message: Self::Message) -> Task<cosmic::Action<Self::Message>> {
        self.update(message)
    }
}
