// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery through the GStreamer device monitor
//!
//! The monitor hides providers that another provider supersedes, so on a
//! PipeWire desktop the same webcam is reported once (by PipeWire) rather than
//! once per API.

use super::types::{BackendResult, CameraDevice, DeviceSource};
use crate::constants::pipeline::VIDEO_SOURCE_CLASS;
use crate::errors::CameraError;
use gstreamer::prelude::*;
use tracing::{debug, info, warn};

/// Enumerate cameras, PipeWire nodes first
pub fn enumerate_cameras() -> BackendResult<Vec<CameraDevice>> {
    gstreamer::init().map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

    let monitor = gstreamer::DeviceMonitor::new();
    let caps = gstreamer::Caps::new_empty_simple("video/x-raw");
    monitor.add_filter(Some(VIDEO_SOURCE_CLASS), Some(&caps));

    if let Err(e) = monitor.start() {
        warn!(error = %e, "Device monitor failed to start, falling back to auto source");
        return Ok(vec![CameraDevice::auto()]);
    }
    let devices = monitor.devices();
    monitor.stop();

    let found: Vec<CameraDevice> = devices
        .iter()
        .filter_map(|device| {
            let name = device.display_name().to_string();
            let props = device.properties()?;
            let source = source_from_properties(|key| property_string(&props, key))?;
            debug!(name = %name, ?source, "Found camera");
            Some(CameraDevice { name, source })
        })
        .collect();

    let cameras = select_cameras(found);
    info!(count = cameras.len(), "Enumerated cameras");
    Ok(cameras)
}

/// Camera list shown to the user from what the monitor reported.
///
/// V4L2 duplicates of PipeWire nodes are dropped. An empty result becomes the
/// automatic source, so a device the monitor could not identify still opens.
pub fn select_cameras(mut cameras: Vec<CameraDevice>) -> Vec<CameraDevice> {
    if cameras
        .iter()
        .any(|c| matches!(c.source, DeviceSource::PipeWire { .. }))
    {
        cameras.retain(|c| matches!(c.source, DeviceSource::PipeWire { .. }));
    }

    if cameras.is_empty() {
        warn!("No identifiable camera found, falling back to auto source");
        cameras.push(CameraDevice::auto());
    }
    cameras
}

/// Pick the index of the camera matching `last_id`, or the first one
pub fn preferred_index(cameras: &[CameraDevice], last_id: Option<&str>) -> usize {
    last_id
        .and_then(|id| cameras.iter().position(|c| c.id() == id))
        .unwrap_or(0)
}

/// Map device provider properties onto a source element.
///
/// PipeWire nodes carry `object.serial` (preferred by `pipewiresrc target-object`)
/// or `node.name`; V4L2 devices carry `device.path` or `api.v4l2.path`.
pub fn source_from_properties(get: impl Fn(&str) -> Option<String>) -> Option<DeviceSource> {
    if let Some(target) = get("object.serial").or_else(|| get("node.name")) {
        return Some(DeviceSource::PipeWire { target });
    }
    get("device.path")
        .or_else(|| get("api.v4l2.path"))
        .map(|path| DeviceSource::V4l2 { path })
}

fn property_string(props: &gstreamer::StructureRef, key: &str) -> Option<String> {
    let value = props.value(key).ok()?;
    if let Ok(s) = value.get::<String>() {
        return Some(s);
    }
    if let Ok(n) = value.get::<u64>() {
        return Some(n.to_string());
    }
    if let Ok(n) = value.get::<i64>() {
        return Some(n.to_string());
    }
    value.get::<i32>().ok().map(|n| n.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn pipewire_serial_wins() {
        let p = props(&[("object.serial", "57"), ("device.path", "/dev/video0")]);
        let source = source_from_properties(|k| p.get(k).cloned());
        assert_eq!(
            source,
            Some(DeviceSource::PipeWire {
                target: "57".into()
            })
        );
    }

    #[test]
    fn v4l2_path_fallback() {
        let p = props(&[("api.v4l2.path", "/dev/video2")]);
        let source = source_from_properties(|k| p.get(k).cloned());
        assert_eq!(
            source,
            Some(DeviceSource::V4l2 {
                path: "/dev/video2".into()
            })
        );
    }

    #[test]
    fn unknown_provider_is_skipped() {
        let p = props(&[("device.api", "something")]);
        assert_eq!(source_from_properties(|k| p.get(k).cloned()), None);
    }

    #[test]
    fn empty_monitor_falls_back_to_auto_source() {
        assert_eq!(select_cameras(Vec::new()), vec![CameraDevice::auto()]);
    }

    #[test]
    fn pipewire_nodes_hide_v4l2_duplicates() {
        let v4l2 = CameraDevice {
            name: "Webcam".into(),
            source: DeviceSource::V4l2 {
                path: "/dev/video0".into(),
            },
        };
        let node = CameraDevice {
            name: "Webcam".into(),
            source: DeviceSource::PipeWire {
                target: "57".into(),
            },
        };
        assert_eq!(select_cameras(vec![v4l2.clone(), node.clone()]), vec![node]);
        assert_eq!(select_cameras(vec![v4l2.clone()]), vec![v4l2]);
    }

    #[test]
    fn preferred_index_restores_last_camera() {
        let cams = vec![
            CameraDevice::auto(),
            CameraDevice {
                name: "USB".into(),
                source: DeviceSource::V4l2 {
                    path: "/dev/video4".into(),
                },
            },
        ];
        assert_eq!(preferred_index(&cams, Some("v4l2:/dev/video4")), 1);
        assert_eq!(preferred_index(&cams, Some("v4l2:/dev/video9")), 0);
        assert_eq!(preferred_index(&cams, None), 0);
    }
}
