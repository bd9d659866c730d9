// SPDX-License-Identifier: GPL-3.0-only

//! System suspend coordination through logind
//!
//! While the camera is in use the app holds a *delay* inhibitor lock. logind
//! announces an upcoming suspend with `PrepareForSleep(true)` and then waits
//! until every delay lock is closed (or its timeout expires). The app closes
//! the camera and only then completes the [`SuspendDeferral`], which closes
//! the lock.

use futures::{SinkExt, StreamExt};
use std::os::fd::OwnedFd;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

const LOGIND_DESTINATION: &str = "org.freedesktop.login1";
const LOGIND_PATH: &str = "/org/freedesktop/login1";
const LOGIND_MANAGER: &str = "org.freedesktop.login1.Manager";

/// Open logind delay lock; suspend waits while this is alive
#[derive(Debug)]
pub struct SleepDelayLock {
    _fd: OwnedFd,
}

impl From<OwnedFd> for SleepDelayLock {
    fn from(fd: OwnedFd) -> Self {
        Self { _fd: fd }
    }
}

/// Handed to the app when a suspend is imminent.
///
/// Cloneable so it can travel inside a message; the lock is released by the
/// first `complete` (or when the last clone drops).
#[derive(Debug, Clone)]
pub struct SuspendDeferral {
    lock: Arc<Mutex<Option<SleepDelayLock>>>,
}

impl SuspendDeferral {
    pub fn new(lock: Option<SleepDelayLock>) -> Self {
        Self {
            lock: Arc::new(Mutex::new(lock)),
        }
    }

    /// Let the suspend proceed
    pub fn complete(&self) {
        let released = self
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            info!("Suspend deferral completed");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Events produced by [`watch_sleep`]
#[derive(Debug, Clone)]
pub enum SleepEvent {
    /// Suspend is imminent; complete the deferral once resources are released
    Suspending(SuspendDeferral),
    Resumed,
}

/// Take a delay lock for sleep
pub async fn take_delay_lock(connection: &zbus::Connection) -> zbus::Result<SleepDelayLock> {
    let manager = manager_proxy(connection).await?;
    let fd: zbus::zvariant::OwnedFd = manager
        .call(
            "Inhibit",
            &("sleep", "Jolt", "Release the camera before suspend", "delay"),
        )
        .await?;
    debug!("Took logind sleep delay lock");
    Ok(SleepDelayLock::from(OwnedFd::from(fd)))
}

async fn manager_proxy(connection: &zbus::Connection) -> zbus::Result<zbus::Proxy<'static>> {
    zbus::Proxy::new(connection, LOGIND_DESTINATION, LOGIND_PATH, LOGIND_MANAGER).await
}

/// Hold a delay lock and forward `PrepareForSleep` as [`SleepEvent`]s.
///
/// Runs until `output` closes. Without a system bus (containers, non-systemd
/// systems) it logs once and returns; suspend then proceeds without waiting.
pub async fn watch_sleep(mut output: futures::channel::mpsc::Sender<SleepEvent>) {
    let connection = match zbus::Connection::system().await {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "No system bus, suspend will not wait for camera release");
            return;
        }
    };
    let manager = match manager_proxy(&connection).await {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "logind unavailable");
            return;
        }
    };
    let mut signals = match manager.receive_signal("PrepareForSleep").await {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Cannot subscribe to PrepareForSleep");
            return;
        }
    };

    let mut lock = take_lock_logged(&connection).await;

    while let Some(message) = signals.next().await {
        let start: bool = match message.body().deserialize() {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Malformed PrepareForSleep signal");
                continue;
            }
        };

        let event = if start {
            info!("System is preparing to sleep");
            SleepEvent::Suspending(SuspendDeferral::new(lock.take()))
        } else {
            info!("System resumed");
            lock = take_lock_logged(&connection).await;
            SleepEvent::Resumed
        };

        if output.send(event).await.is_err() {
            break;
        }
    }
    debug!("Sleep watch stopped");
}

async fn take_lock_logged(connection: &zbus::Connection) -> Option<SleepDelayLock> {
    match take_delay_lock(connection).await {
        Ok(lock) => Some(lock),
        Err(e) => {
            warn!(error = %e, "Could not take sleep delay lock");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_lock() -> SleepDelayLock {
        let file = std::fs::File::open("/dev/null").expect("open /dev/null");
        SleepDelayLock::from(OwnedFd::from(file))
    }

    #[test]
    fn deferral_completes_once() {
        let deferral = SuspendDeferral::new(Some(fake_lock()));
        let copy = deferral.clone();
        assert!(deferral.is_pending());
        copy.complete();
        assert!(!deferral.is_pending());
        // Second completion is harmless
        deferral.complete();
    }

    #[test]
    fn deferral_without_lock_is_not_pending() {
        assert!(!SuspendDeferral::new(None).is_pending());
    }
}
