// SPDX-License-Identifier: GPL-3.0-only

//! Display and suspend integration
//!
//! - `keep_alive`: keep the display on while the preview runs
//! - `sleep`: hold system suspend until the camera is released

pub mod keep_alive;
pub mod sleep;

pub use keep_alive::{DisplayInhibitor, KeepAliveGuard, KeepAliveRequest, ScreenSaverInhibitor};
pub use sleep::{SleepEvent, SuspendDeferral};
