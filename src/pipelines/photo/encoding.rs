// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding with EXIF orientation
//!
//! The encoder output gets an EXIF APP1 segment carrying only the
//! Orientation tag, set to "normal", so viewers never auto-rotate captures.

use crate::constants::EXIF_ORIENTATION_NORMAL;
use crate::errors::PhotoError;
use crate::storage::PhotoLibrary;
use image::RgbImage;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

const MARKER_SOI: [u8; 2] = [0xFF, 0xD8];
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Encode as baseline JPEG with the given quality (1-100)
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, PhotoError> {
    let mut buffer = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
        &mut buffer,
        quality.clamp(1, 100),
    );
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;
    Ok(buffer)
}

/// TIFF-structured EXIF block with Orientation = normal
pub fn orientation_exif() -> Result<Vec<u8>, PhotoError> {
    let field = exif::Field {
        tag: exif::Tag::Orientation,
        ifd_num: exif::In::PRIMARY,
        value: exif::Value::Short(vec![EXIF_ORIENTATION_NORMAL]),
    };
    let mut writer = exif::experimental::Writer::new();
    writer.push_field(&field);

    let mut tiff = std::io::Cursor::new(Vec::new());
    writer
        .write(&mut tiff, false)
        .map_err(|e| PhotoError::EncodingFailed(format!("EXIF encoding failed: {}", e)))?;
    Ok(tiff.into_inner())
}

/// Splice an APP1 EXIF segment into a JPEG stream.
///
/// Placed after a leading JFIF APP0 segment if there is one, otherwise
/// directly after SOI.
pub fn insert_exif(jpeg: &[u8], tiff: &[u8]) -> Result<Vec<u8>, PhotoError> {
    if jpeg.len() < 4 || jpeg[..2] != MARKER_SOI {
        return Err(PhotoError::EncodingFailed("Not a JPEG stream".to_string()));
    }
    let segment_len = 2 + EXIF_HEADER.len() + tiff.len();
    let segment_len = u16::try_from(segment_len)
        .map_err(|_| PhotoError::EncodingFailed("EXIF block too large".to_string()))?;

    let mut insert_at = 2;
    if jpeg[2] == 0xFF && jpeg[3] == MARKER_APP0 && jpeg.len() >= 6 {
        let app0_len = u16::from_be_bytes([jpeg[4], jpeg[5]]) as usize;
        insert_at = (4 + app0_len).min(jpeg.len());
    }

    let mut out = Vec::with_capacity(jpeg.len() + segment_len as usize + 2);
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&[0xFF, MARKER_APP1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[insert_at..]);
    Ok(out)
}

/// Encode a capture: JPEG plus orientation metadata
pub fn encode_photo(image: &RgbImage, quality: u8) -> Result<Vec<u8>, PhotoError> {
    let jpeg = encode_jpeg(image, quality)?;
    let data = insert_exif(&jpeg, &orientation_exif()?)?;
    debug!(size = data.len(), "Encoding complete");
    Ok(data)
}

/// Write encoded bytes to a fresh, uniquely named file in `library`
pub fn save(library: &PhotoLibrary, file_name: &str, data: &[u8]) -> Result<PathBuf, PhotoError> {
    let (path, mut file) = library.create_unique(file_name)?;
    let written = file.write_all(data).and_then(|_| file.sync_all());
    if let Err(e) = written {
        // Leave no truncated photo behind
        let _ = std::fs::remove_file(&path);
        return Err(PhotoError::SaveFailed(e.to_string()));
    }
    info!(path = %path.display(), "Photo saved successfully");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(16, 8, |x, y| image::Rgb([(x * 16) as u8, (y * 32) as u8, 90]))
    }

    #[test]
    fn orientation_is_normal_in_saved_stream() {
        let data = encode_photo(&sample_image(), 90).unwrap();
        let reader = exif::Reader::new();
        let parsed = reader
            .read_from_container(&mut std::io::Cursor::new(&data))
            .expect("EXIF present");
        let field = parsed
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .expect("orientation tag");
        assert_eq!(field.value.get_uint(0), Some(1));
    }

    #[test]
    fn stream_still_decodes() {
        let data = encode_photo(&sample_image(), 90).unwrap();
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn rejects_non_jpeg() {
        assert!(insert_exif(b"\x89PNG....", &[0; 8]).is_err());
    }

    #[test]
    fn app1_follows_app0() {
        let jpeg = encode_jpeg(&sample_image(), 80).unwrap();
        let out = insert_exif(&jpeg, &[1, 2, 3]).unwrap();
        if jpeg[3] == MARKER_APP0 {
            let app0_len = u16::from_be_bytes([jpeg[4], jpeg[5]]) as usize;
            assert_eq!(out[4 + app0_len + 1], MARKER_APP1);
        } else {
            assert_eq!(out[3], MARKER_APP1);
        }
        assert_eq!(out.len(), jpeg.len() + 2 + 2 + EXIF_HEADER.len() + 3);
    }
}
