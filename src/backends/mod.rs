// SPDX-License-Identifier: GPL-3.0-only

//! Hardware access
//!
//! - [`camera`]: device enumeration, the GStreamer preview pipeline and the
//!   capture session that owns an open device

pub mod camera;
