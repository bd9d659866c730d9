// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera application

use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Camera-specific errors
///
/// `AccessDenied` and `DeviceBusy` are the two conditions the user is expected
/// to run into; both are recoverable and shown as a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    /// No camera devices found
    #[error("No camera devices found")]
    NoCameraFound,
    /// Camera permission was declined (portal or device node permissions)
    #[error("Access to the camera was denied")]
    AccessDenied,
    /// Another process holds exclusive control of the device
    #[error("Camera is in exclusive use by another application")]
    DeviceBusy,
    /// A session is already open on this page
    #[error("A camera session is already open")]
    AlreadyOpen,
    /// System suspend in progress; opening waits for resume
    #[error("The system is suspending")]
    Suspended,
    /// Still capture requested without an active preview
    #[error("Camera preview is not running")]
    NotPreviewing,
    /// Preview is running but no frame has arrived yet
    #[error("No frame available for capture")]
    NoFrameAvailable,
    /// Pipeline could not be built
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    /// Runtime failure reported by the device or the streaming pipeline
    #[error("Device failure: {0}")]
    DeviceFailed(String),
}

impl CameraError {
    /// Errors the user can resolve without restarting the application
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CameraError::AccessDenied | CameraError::DeviceBusy)
    }
}

/// Photo capture errors
#[derive(Debug, Clone, Error)]
pub enum PhotoError {
    /// Encoding failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    /// Save failed
    #[error("Save failed: {0}")]
    SaveFailed(String),
}

/// Output folder errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Neither XDG pictures dir nor $HOME could be resolved
    #[error("No pictures directory available")]
    NoPicturesDirectory,
    #[error("{0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

impl From<StorageError> for PhotoError {
    fn from(err: StorageError) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_errors() {
        assert!(CameraError::AccessDenied.is_recoverable());
        assert!(CameraError::DeviceBusy.is_recoverable());
        assert!(!CameraError::DeviceFailed("gone".into()).is_recoverable());
    }

    #[test]
    fn io_error_maps_to_save_failed() {
        let err: PhotoError = std::io::Error::other("disk full").into();
        assert!(matches!(err, PhotoError::SaveFailed(ref msg) if msg == "disk full"));
    }
}
