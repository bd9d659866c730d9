// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::errors::CameraError;
use futures::channel::mpsc;
use std::sync::Arc;
use std::time::Instant;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, CameraError>;

/// Sender half used by the streaming thread to hand frames to the UI
pub type FrameSender = mpsc::Sender<CameraFrame>;

/// How a device is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSource {
    /// PipeWire node, addressed by its object serial (or node name)
    PipeWire { target: String },
    /// V4L2 device node, e.g. `/dev/video0`
    V4l2 { path: String },
    /// Let GStreamer pick (`autovideosrc`)
    Auto,
}

/// A camera the user can open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Human-readable name (e.g., "Integrated Camera")
    pub name: String,
    pub source: DeviceSource,
}

impl CameraDevice {
    /// Stable identifier persisted in the config as the last used camera
    pub fn id(&self) -> String {
        match &self.source {
            DeviceSource::PipeWire { target } => format!("pipewire:{}", target),
            DeviceSource::V4l2 { path } => format!("v4l2:{}", path),
            DeviceSource::Auto => "auto".to_string(),
        }
    }

    /// Fallback used when enumeration finds nothing specific
    pub fn auto() -> Self {
        Self {
            name: "Default Camera".to_string(),
            source: DeviceSource::Auto,
        }
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id())
    }
}

/// A single RGBA frame
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, may exceed `width * 4`
    pub stride: u32,
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
            data: Arc::from(data),
            captured_at: Instant::now(),
        }
    }

    /// Pixel rows without stride padding
    pub fn packed_rgba(&self) -> Vec<u8> {
        let row_len = self.width as usize * 4;
        if self.stride as usize == row_len {
            return self.data.to_vec();
        }
        self.data
            .chunks(self.stride as usize)
            .take(self.height as usize)
            .flat_map(|row| &row[..row_len.min(row.len())])
            .copied()
            .collect()
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Live output of a started preview
///
/// Frames are dropped when the UI lags behind; failures are never dropped.
pub struct PreviewStream {
    pub frames: mpsc::Receiver<CameraFrame>,
    pub failures: mpsc::UnboundedReceiver<CameraError>,
}

impl PreviewStream {
    /// Create a stream plus the sending halves for the producer
    pub fn channel(
        capacity: usize,
    ) -> (FrameSender, mpsc::UnboundedSender<CameraError>, PreviewStream) {
        let (frame_tx, frames) = mpsc::channel(capacity);
        let (failure_tx, failures) = mpsc::unbounded();
        (frame_tx, failure_tx, PreviewStream { frames, failures })
    }
}

impl std::fmt::Debug for PreviewStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PreviewStream")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_rgba_strips_padding() {
        // 2x2 frame with 4 bytes of padding per row
        let mut data = Vec::new();
        data.extend_from_slice(&[1, 1, 1, 1, 2, 2, 2, 2, 0, 0, 0, 0]);
        data.extend_from_slice(&[3, 3, 3, 3, 4, 4, 4, 4, 0, 0, 0, 0]);
        let frame = CameraFrame {
            width: 2,
            height: 2,
            stride: 12,
            data: Arc::from(data),
            captured_at: Instant::now(),
        };
        let packed = frame.packed_rgba();
        assert_eq!(packed.len(), 16);
        assert_eq!(&packed[8..12], &[3, 3, 3, 3]);
    }

    #[test]
    fn device_ids_are_stable() {
        let dev = CameraDevice {
            name: "Cam".into(),
            source: DeviceSource::V4l2 {
                path: "/dev/video0".into(),
            },
        };
        assert_eq!(dev.id(), "v4l2:/dev/video0");
        assert_eq!(CameraDevice::auto().id(), "auto");
    }
}
