// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the photo pipeline

use jolt::backends::camera::CameraFrame;
use jolt::pipelines::photo::PhotoPipeline;
use jolt::storage::PhotoLibrary;
use std::sync::Arc;

fn test_frame(width: u32, height: u32) -> Arc<CameraFrame> {
    let data = (0..width * height)
        .flat_map(|i| [(i % 256) as u8, 128, 64, 255])
        .collect();
    Arc::new(CameraFrame::from_rgba(width, height, data))
}

#[tokio::test]
async fn test_each_capture_creates_one_new_file() {
    let dir = std::env::temp_dir().join(format!("jolt-photo-{}", uuid::Uuid::new_v4()));
    let library = PhotoLibrary::new(&dir);
    let pipeline = PhotoPipeline::with_quality(85);

    let first = pipeline
        .capture_and_save(test_frame(32, 24), library.clone())
        .await
        .expect("first capture");
    let second = pipeline
        .capture_and_save(test_frame(32, 24), library.clone())
        .await
        .expect("second capture");

    assert_ne!(first, second);
    assert_eq!(first.file_name().unwrap(), "photo.jpg");
    assert_eq!(second.file_name().unwrap(), "photo (2).jpg");
    assert_eq!(library.list().unwrap().len(), 2);

    let decoded = image::open(&second).expect("saved file is an image");
    assert_eq!((decoded.width(), decoded.height()), (32, 24));
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_saved_photo_has_normal_orientation() {
    let dir = std::env::temp_dir().join(format!("jolt-photo-{}", uuid::Uuid::new_v4()));
    let library = PhotoLibrary::new(&dir);

    let path = PhotoPipeline::new()
        .capture_and_save(test_frame(16, 16), library)
        .await
        .unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let exif = exif::Reader::new()
        .read_from_container(&mut std::io::BufReader::new(file))
        .expect("EXIF block");
    let orientation = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .expect("orientation tag");
    assert_eq!(orientation.value.get_uint(0), Some(1));
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_truncated_frame_writes_nothing() {
    let dir = std::env::temp_dir().join(format!("jolt-photo-{}", uuid::Uuid::new_v4()));
    let library = PhotoLibrary::new(&dir);
    let frame = Arc::new(CameraFrame::from_rgba(64, 64, vec![0; 100]));

    assert!(
        PhotoPipeline::new()
            .capture_and_save(frame, library.clone())
            .await
            .is_err()
    );
    assert!(!dir.exists() || library.list().unwrap().is_empty());
    let _ = std::fs::remove_dir_all(dir);
}
