// SPDX-License-Identifier: GPL-3.0-only

//! Camera portal access for sandboxed builds
//!
//! Inside a Flatpak the camera is only reachable through
//! `org.freedesktop.portal.Camera`: the user is asked once, and a PipeWire
//! remote restricted to cameras is handed back as a file descriptor.
//! Outside a sandbox the portal is skipped and device node permissions apply.

use crate::errors::CameraError;
use std::collections::HashMap;
use std::os::fd::OwnedFd;
use std::path::Path;
use tracing::{debug, info, warn};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

const PORTAL_DESTINATION: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const CAMERA_INTERFACE: &str = "org.freedesktop.portal.Camera";
const REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";

/// Portal response codes
const RESPONSE_SUCCESS: u32 = 0;

/// Whether the process runs inside a Flatpak sandbox
pub fn is_sandboxed() -> bool {
    Path::new("/.flatpak-info").exists()
}

/// Ask the portal for camera access and open a PipeWire remote.
///
/// Blocks until the user answers the permission dialog.
pub fn request_camera_remote() -> Result<OwnedFd, CameraError> {
    let connection = zbus::blocking::Connection::session()
        .map_err(|e| CameraError::InitializationFailed(format!("session bus: {}", e)))?;

    let granted = access_camera(&connection)?;
    if !granted {
        info!("Camera portal denied access");
        return Err(CameraError::AccessDenied);
    }

    let camera = zbus::blocking::Proxy::new(
        &connection,
        PORTAL_DESTINATION,
        PORTAL_PATH,
        CAMERA_INTERFACE,
    )
    .map_err(portal_error)?;

    let options: HashMap<&str, Value> = HashMap::new();
    let fd: zbus::zvariant::OwnedFd = camera
        .call("OpenPipeWireRemote", &(options,))
        .map_err(portal_error)?;
    debug!("Camera portal opened PipeWire remote");
    Ok(fd.into())
}

fn access_camera(connection: &zbus::blocking::Connection) -> Result<bool, CameraError> {
    let sender = connection
        .unique_name()
        .ok_or_else(|| CameraError::InitializationFailed("no unique bus name".to_string()))?
        .trim_start_matches(':')
        .replace('.', "_");
    let token = format!("jolt_{}", std::process::id());
    let request_path = request_path(&sender, &token);

    // Subscribe before calling so the Response signal cannot be missed
    let request = zbus::blocking::Proxy::new(
        connection,
        PORTAL_DESTINATION,
        request_path.as_str(),
        REQUEST_INTERFACE,
    )
    .map_err(portal_error)?;
    let mut responses = request.receive_signal("Response").map_err(portal_error)?;

    let camera = zbus::blocking::Proxy::new(
        connection,
        PORTAL_DESTINATION,
        PORTAL_PATH,
        CAMERA_INTERFACE,
    )
    .map_err(portal_error)?;

    let mut options: HashMap<&str, Value> = HashMap::new();
    options.insert("handle_token", Value::from(token.as_str()));
    let handle: OwnedObjectPath = camera
        .call("AccessCamera", &(options,))
        .map_err(portal_error)?;
    debug!(handle = %handle, "Waiting for camera portal response");

    let message = responses
        .next()
        .ok_or_else(|| CameraError::InitializationFailed("portal closed".to_string()))?;
    let (code, _results): (u32, HashMap<String, OwnedValue>) =
        message.body().deserialize().map_err(portal_error)?;

    if code != RESPONSE_SUCCESS {
        warn!(code, "Camera portal request not granted");
    }
    Ok(code == RESPONSE_SUCCESS)
}

/// Object path the portal uses for a request made with `token`
fn request_path(sender: &str, token: &str) -> String {
    format!("{}/request/{}/{}", PORTAL_PATH, sender, token)
}

fn portal_error(err: zbus::Error) -> CameraError {
    CameraError::InitializationFailed(format!("camera portal: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_path_layout() {
        assert_eq!(
            request_path("1_42", "jolt_7"),
            "/org/freedesktop/portal/desktop/request/1_42/jolt_7"
        );
    }
}
