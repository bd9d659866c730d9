// SPDX-License-Identifier: GPL-3.0-only

//! Jolt - a two-page camera app
//!
//! A gallery page lists the photos in the app's picture folder; a capture
//! page shows a live camera preview and saves stills into that folder.
//!
//! - [`app`]: COSMIC application, pages and message handling
//! - [`backends`]: camera enumeration, GStreamer backend and capture session
//! - [`pipelines`]: frame → JPEG photo pipeline
//! - [`power`]: display keep-alive and suspend coordination
//! - [`storage`]: picture folder listing, unique names, thumbnails, deletion
//! - [`config`]: persisted user settings

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod i18n;
pub mod pipelines;
pub mod power;
pub mod storage;

pub use app::{AppModel, Message};
pub use config::Config;
pub use errors::{AppError, AppResult, CameraError, PhotoError, StorageError};
