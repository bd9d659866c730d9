// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use jolt::constants::{CAPTURE_FILE_NAME, EXIF_ORIENTATION_NORMAL, thumbnail, timing};

#[test]
fn test_capture_file_name_is_jpeg() {
    assert!(CAPTURE_FILE_NAME.ends_with(".jpg"));
}

#[test]
fn test_orientation_is_normal() {
    assert_eq!(EXIF_ORIENTATION_NORMAL, 1);
}

#[test]
fn test_thumbnail_display_fits_decode_box() {
    assert!(thumbnail::DISPLAY_SIZE <= thumbnail::DECODE_SIZE as f32);
}

#[test]
fn test_cli_warmup_shorter_than_timeout() {
    assert!(timing::CLI_WARMUP < timing::CLI_FRAME_TIMEOUT);
}
