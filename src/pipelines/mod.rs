// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! - [`photo`]: still capture from the preview stream to a JPEG file

pub mod photo;
