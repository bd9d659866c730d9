// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Listing available cameras
//! - Taking a photo into the photo folder
//! - Listing and deleting photos

use jolt::app::{AppModel, photo_library};
use jolt::backends::camera::enumeration::{enumerate_cameras, preferred_index};
use jolt::backends::camera::pipeline::GStreamerBackend;
use jolt::backends::camera::{CaptureSession, SessionState};
use jolt::config::{self, Config};
use jolt::constants::timing;
use jolt::errors::CameraError;
use jolt::pipelines::photo::PhotoPipeline;
use jolt::power::{KeepAliveRequest, ScreenSaverInhibitor};
use jolt::storage::PhotoLibrary;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn load_config() -> Config {
    config::load(<AppModel as cosmic::Application>::APP_ID).1
}

fn library(config: &Config) -> PhotoLibrary {
    photo_library(config.effective_folder_name())
}

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config();
    let cameras = match enumerate_cameras() {
        Ok(cameras) => cameras,
        Err(CameraError::NoCameraFound) => {
            println!("No cameras found.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let preferred = preferred_index(&cameras, config.last_camera_id.as_deref());

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let marker = if index == preferred { "*" } else { " " };
        println!("{} [{}] {}", marker, index, camera.name);
        println!("      {}", camera.id());
    }
    Ok(())
}

/// Take a photo with the given camera and save it to the photo folder
pub fn take_photo(camera_index: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config();
    let cameras = enumerate_cameras()?;
    let index = camera_index
        .unwrap_or_else(|| preferred_index(&cameras, config.last_camera_id.as_deref()));
    let Some(camera) = cameras.get(index) else {
        return Err(format!(
            "Camera index {} out of range (0-{})",
            index,
            cameras.len() - 1
        )
        .into());
    };
    println!("Using camera: {}", camera.name);

    let keep_alive = KeepAliveRequest::new(Arc::new(ScreenSaverInhibitor::new(
        "Jolt",
        "Taking a photo",
    )));
    let session = CaptureSession::new(Box::new(GStreamerBackend::new()), keep_alive);

    match session.open(camera)? {
        SessionState::Previewing => {}
        _ => {
            session.close();
            return Err(CameraError::DeviceBusy.into());
        }
    }

    println!("Capturing...");
    let frame = wait_for_frame(&session);
    // Released before encoding; the still is already in memory
    session.close();
    let frame = frame?;

    let library = library(&config);
    let pipeline = PhotoPipeline::with_quality(config.effective_jpeg_quality());
    let rt = tokio::runtime::Runtime::new()?;
    let path = rt.block_on(pipeline.capture_and_save(frame, library))?;

    println!("Photo saved: {}", path.display());
    Ok(())
}

/// Let auto exposure settle, then take the newest frame
fn wait_for_frame(
    session: &CaptureSession,
) -> Result<Arc<jolt::backends::camera::CameraFrame>, CameraError> {
    let mut stream = session.take_preview_stream();
    let start = Instant::now();

    loop {
        if let Some(stream) = stream.as_mut()
            && let Ok(Some(error)) = stream.failures.try_next()
        {
            return Err(session.fail(error));
        }

        if start.elapsed() >= timing::CLI_WARMUP {
            match session.capture_still() {
                Ok(frame) => return Ok(frame),
                Err(CameraError::NoFrameAvailable) => {}
                Err(e) => return Err(e),
            }
        }

        if start.elapsed() >= timing::CLI_FRAME_TIMEOUT {
            return Err(CameraError::NoFrameAvailable);
        }
        // Keep the frame channel drained so the stream stays live
        if let Some(stream) = stream.as_mut() {
            while let Ok(Some(_)) = stream.frames.try_next() {}
        }
        std::thread::sleep(Duration::from_millis(16));
    }
}

#[derive(Serialize)]
struct GalleryEntry {
    name: String,
    file: String,
    size: u64,
    modified: Option<String>,
}

/// List the photo folder
pub fn list_gallery(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let library = library(&load_config());
    let entries: Vec<GalleryEntry> = library
        .list()?
        .into_iter()
        .map(|entry| GalleryEntry {
            name: entry.display_name,
            file: entry.file_name,
            size: entry.size,
            modified: entry.modified.map(|m| m.to_rfc3339()),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", library.dir().display());
    if entries.is_empty() {
        println!("No photos.");
        return Ok(());
    }
    for entry in &entries {
        println!("  {:<24} {:>10} bytes  {}", entry.name, entry.size, entry.file);
    }
    Ok(())
}

/// Delete every photo with the given display name
pub fn delete_photo(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let library = library(&load_config());
    let deleted = library.delete_by_display_name(name)?;
    match deleted {
        0 => println!("No photo named \"{}\".", name),
        1 => println!("Deleted \"{}\".", name),
        n => println!("Deleted {} files named \"{}\".", n, name),
    }
    Ok(())
}
