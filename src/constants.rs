// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default name of the output folder inside the user's Pictures directory
pub const DEFAULT_FOLDER_NAME: &str = "Jolt Pictures";

/// Base file name for captured photos; collisions get ` (2)`, ` (3)`, ...
pub const CAPTURE_FILE_NAME: &str = "photo.jpg";

/// Upper bound on uniquifier attempts before giving up on a name
pub const MAX_UNIQUE_NAME_ATTEMPTS: u32 = 10_000;

/// JPEG quality used when the config has none
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// EXIF orientation value for "normal" (row 0 top, column 0 left)
pub const EXIF_ORIENTATION_NORMAL: u16 = 1;

/// Thumbnail sizes
pub mod thumbnail {
    /// Bounded decode box for gallery thumbnails
    pub const DECODE_SIZE: u32 = 150;
    /// Maximum on-screen size of a thumbnail
    pub const DISPLAY_SIZE: f32 = 50.0;
}

/// GStreamer pipeline settings
pub mod pipeline {
    /// Appsink queue depth; older frames are dropped
    pub const MAX_BUFFERS: u32 = 2;
    /// Frame channel capacity between the streaming thread and the UI
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;
    /// Device monitor class filter for cameras
    pub const VIDEO_SOURCE_CLASS: &str = "Video/Source";
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Max wait for the pipeline to reach PLAYING
    pub const START_TIMEOUT_SECS: u64 = 5;
    /// Max wait for the pipeline to reach NULL
    pub const STOP_TIMEOUT_SECS: u64 = 2;
    /// Interval between preview attempts while another app holds the camera
    pub const BLOCKED_RETRY_INTERVAL: Duration = Duration::from_secs(2);
    /// CLI warm-up before grabbing a still (auto exposure settles)
    pub const CLI_WARMUP: Duration = Duration::from_millis(800);
    /// CLI give-up time when no frame arrives
    pub const CLI_FRAME_TIMEOUT: Duration = Duration::from_secs(5);
    /// Log frame statistics every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 120;
}

/// UI dimensions
pub mod ui {
    /// Capture button diameter
    pub const CAPTURE_BUTTON_SIZE: f32 = 64.0;
    /// Top margin of a gallery row
    pub const GALLERY_ROW_TOP_MARGIN: f32 = 20.0;
    /// Gap between a thumbnail and its delete button
    pub const GALLERY_DELETE_GAP: f32 = 130.0;
}
