// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::backends::camera::types::{CameraDevice, CameraFrame};
use crate::backends::camera::{CaptureSession, SessionState};
use crate::config::Config;
use crate::errors::CameraError;
use crate::pipelines::photo::PhotoPipeline;
use crate::power::SleepEvent;
use crate::storage::{GalleryItem, PhotoLibrary};
use chrono::{DateTime, Local};
use cosmic::cosmic_config;
use cosmic::widget::about::About;
use cosmic::widget::image::Handle;
use std::path::PathBuf;
use std::sync::Arc;

/// The two pages of the app
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Page {
    /// Initial page: the photo folder with thumbnails and delete buttons
    #[default]
    Gallery,
    /// Live preview and capture button
    Capture,
}

/// The context page to display in the context drawer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ContextPage {
    #[default]
    About,
    Settings,
}

/// A gallery row, ready to render
#[derive(Debug, Clone)]
pub struct GalleryRow {
    /// Key used for deletion
    pub display_name: String,
    pub file_name: String,
    pub modified: Option<DateTime<Local>>,
    pub thumbnail: Option<Handle>,
}

impl From<GalleryItem> for GalleryRow {
    fn from(item: GalleryItem) -> Self {
        let thumbnail = item.thumbnail.map(|thumb| {
            Handle::from_rgba(thumb.width, thumb.height, thumb.rgba.as_ref().clone())
        });
        Self {
            display_name: item.entry.display_name,
            file_name: item.entry.file_name,
            modified: item.entry.modified,
            thumbnail,
        }
    }
}

/// Gallery listing state
#[derive(Debug, Default)]
pub struct GalleryState {
    pub rows: Vec<GalleryRow>,
    /// Bumped per listing pass; results of older passes are discarded
    pub generation: u64,
    pub loading: bool,
}

/// The application model stores app-specific state used to describe its interface and
/// drive its logic.
pub struct AppModel {
    /// Application state which is managed by the COSMIC runtime.
    pub core: cosmic::Core,
    /// Display a context drawer with the designated page if defined.
    pub context_page: ContextPage,
    /// The about page for this app.
    pub about: About,
    /// Configuration data that persists between application runs.
    pub config: Config,
    /// Configuration handler for saving settings
    pub config_handler: Option<cosmic_config::Config>,
    /// Page currently shown
    pub page: Page,
    /// Camera session owned by the capture page
    pub session: CaptureSession,
    /// Last known session state, mirrored for the view and subscriptions
    pub session_state: SessionState,
    /// Preview generation the frame subscription is keyed on
    pub preview_generation: u64,
    /// Session open in flight
    pub opening: bool,
    /// Blocked-preview retry in flight
    pub retrying: bool,
    /// Reopen the session once the system resumes
    pub reopen_on_resume: bool,
    /// Suspend notice received and no resume seen yet; opens are refused
    pub suspending: bool,
    /// Output folder
    pub library: PhotoLibrary,
    /// Frame → JPEG pipeline
    pub photo_pipeline: PhotoPipeline,
    /// Cameras found by the last enumeration
    pub available_cameras: Vec<CameraDevice>,
    pub current_camera_index: usize,
    pub camera_dropdown_options: Vec<String>,
    /// Latest preview frame as an image handle
    pub preview: Option<Handle>,
    /// Frames received since the current preview started
    pub preview_frames: u64,
    /// Whether a photo capture is in progress
    pub is_capturing: bool,
    pub gallery: GalleryState,
    /// Dismissible error banner
    pub error: Option<String>,
    pub theme_dropdown_options: Vec<String>,
}

/// Messages emitted by the application and its widgets.
///
/// Messages are organized into logical groups:
/// - **UI Navigation**: context pages, page switches, external URLs
/// - **Camera**: enumeration, session results, preview frames, failures
/// - **Capture**: still capture and save
/// - **Gallery**: listing, deletion, folder
/// - **Settings**: configuration changes
/// - **System**: suspend/resume and window close
#[derive(Debug, Clone)]
pub enum Message {
    // ===== UI Navigation =====
    /// Open external URL (repository, etc.)
    LaunchUrl(String),
    /// Toggle context drawer page (About, Settings)
    ToggleContextPage(ContextPage),
    /// "Take photo" on the gallery page
    OpenCapture,
    /// Leave the capture page without capturing
    BackToGallery,
    /// Hide the error banner
    DismissError,

    // ===== Camera =====
    /// Cameras enumerated asynchronously
    CamerasLoaded(Result<Vec<CameraDevice>, CameraError>),
    /// Result of opening the session
    SessionOpened(Result<SessionState, CameraError>),
    /// Preview frame from the stream
    PreviewFrame(Arc<CameraFrame>),
    /// Runtime failure reported by the stream
    CameraFailed(CameraError),
    /// Timer tick while the preview is blocked
    RetryPreview,
    /// Result of a retry attempt
    PreviewRetried(Result<SessionState, CameraError>),
    /// Session released off the UI thread
    SessionClosed,

    // ===== Capture =====
    Capture,
    PhotoSaved(Result<PathBuf, String>),

    // ===== Gallery =====
    RefreshGallery,
    /// Listing result, tagged with its generation
    GalleryLoaded(u64, Result<Vec<GalleryItem>, String>),
    /// Delete every file with this display name
    DeletePhoto(String),
    PhotoDeleted(Result<usize, String>),
    OpenFolder,

    // ===== Settings =====
    UpdateConfig(Config),
    SetAppTheme(usize),
    SelectCamera(usize),
    ToggleMirrorPreview,
    SetJpegQuality(u8),

    // ===== System =====
    Sleep(SleepEvent),
    /// Camera released after a suspend notice; the deferral has completed
    SuspendCleanupDone,
    /// Session accepts opens again after a resume
    SessionResumed,
    WindowCloseRequested,

    Noop,
}
