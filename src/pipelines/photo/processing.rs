// SPDX-License-Identifier: GPL-3.0-only

//! Frame to image conversion

use crate::backends::camera::types::CameraFrame;
use crate::errors::PhotoError;
use image::{RgbImage, RgbaImage};

/// Drop alpha and stride padding from an RGBA camera frame
pub fn frame_to_rgb(frame: &CameraFrame) -> Result<RgbImage, PhotoError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PhotoError::EncodingFailed("Empty frame".to_string()));
    }
    let expected = frame.stride as usize * (frame.height as usize - 1) + frame.width as usize * 4;
    if frame.stride < frame.width * 4 || frame.data.len() < expected {
        return Err(PhotoError::EncodingFailed(format!(
            "Frame buffer too small: {} bytes for {}x{} (stride {})",
            frame.data.len(),
            frame.width,
            frame.height,
            frame.stride
        )));
    }

    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.packed_rgba())
        .ok_or_else(|| PhotoError::EncodingFailed("Invalid RGBA buffer".to_string()))?;
    Ok(image::DynamicImage::ImageRgba8(rgba).to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_packed_frame() {
        let frame = CameraFrame::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 128]);
        let rgb = frame_to_rgb(&frame).unwrap();
        assert_eq!(rgb.dimensions(), (2, 1));
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 255]);
    }

    #[test]
    fn rejects_short_buffer() {
        let frame = CameraFrame::from_rgba(4, 4, vec![0; 10]);
        assert!(frame_to_rgb(&frame).is_err());
    }
}
