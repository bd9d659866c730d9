// SPDX-License-Identifier: GPL-3.0-only

//! Display keep-alive
//!
//! A counted request: the platform inhibitor is taken when the count goes
//! from zero to one and released when it drops back to zero. Callers hold a
//! [`KeepAliveGuard`]; dropping it is the only way to release, so a request
//! can never be released twice.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Something that can stop the display from blanking
pub trait DisplayInhibitor: Send + Sync {
    /// Returns a cookie identifying the inhibition
    fn inhibit(&self) -> Result<u32, String>;

    fn uninhibit(&self, cookie: u32) -> Result<(), String>;
}

/// `org.freedesktop.ScreenSaver` on the session bus
pub struct ScreenSaverInhibitor {
    app_name: String,
    reason: String,
    connection: Mutex<Option<zbus::blocking::Connection>>,
}

impl ScreenSaverInhibitor {
    pub fn new(app_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            reason: reason.into(),
            connection: Mutex::new(None),
        }
    }

    fn proxy<'a>(
        &self,
        connection: &'a zbus::blocking::Connection,
    ) -> Result<zbus::blocking::Proxy<'a>, String> {
        zbus::blocking::Proxy::new(
            connection,
            "org.freedesktop.ScreenSaver",
            "/org/freedesktop/ScreenSaver",
            "org.freedesktop.ScreenSaver",
        )
        .map_err(|e| format!("Failed to create ScreenSaver proxy: {}", e))
    }

    fn connection(&self) -> Result<zbus::blocking::Connection, String> {
        let mut slot = self.connection.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = zbus::blocking::Connection::session()
            .map_err(|e| format!("Failed to connect to session D-Bus: {}", e))?;
        *slot = Some(conn.clone());
        Ok(conn)
    }
}

impl DisplayInhibitor for ScreenSaverInhibitor {
    fn inhibit(&self) -> Result<u32, String> {
        let connection = self.connection()?;
        let cookie: u32 = self
            .proxy(&connection)?
            .call("Inhibit", &(self.app_name.as_str(), self.reason.as_str()))
            .map_err(|e| format!("ScreenSaver.Inhibit failed: {}", e))?;
        Ok(cookie)
    }

    fn uninhibit(&self, cookie: u32) -> Result<(), String> {
        let connection = self.connection()?;
        self.proxy(&connection)?
            .call::<_, _, ()>("UnInhibit", &(cookie,))
            .map_err(|e| format!("ScreenSaver.UnInhibit failed: {}", e))
    }
}

#[derive(Debug, Default)]
struct RequestState {
    count: u32,
    cookie: Option<u32>,
}

/// Counted keep-alive request shared by everything that needs the display on
#[derive(Clone)]
pub struct KeepAliveRequest {
    state: Arc<Mutex<RequestState>>,
    inhibitor: Arc<dyn DisplayInhibitor>,
}

impl KeepAliveRequest {
    pub fn new(inhibitor: Arc<dyn DisplayInhibitor>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RequestState::default())),
            inhibitor,
        }
    }

    /// Increment the request count, inhibiting on the first request.
    ///
    /// Inhibition is best-effort: a missing screensaver service is logged and
    /// the guard is still handed out.
    pub fn request_active(&self) -> KeepAliveGuard {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.count += 1;
        if state.count == 1 {
            match self.inhibitor.inhibit() {
                Ok(cookie) => {
                    info!(cookie, "Display sleep inhibited");
                    state.cookie = Some(cookie);
                }
                Err(e) => warn!(error = %e, "Could not inhibit display sleep"),
            }
        }
        debug!(count = state.count, "Keep-alive requested");
        KeepAliveGuard {
            request: self.clone(),
        }
    }

    /// Number of outstanding guards
    pub fn active_count(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .count
    }

    fn request_release(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.count == 0 {
            return;
        }
        state.count -= 1;
        debug!(count = state.count, "Keep-alive released");
        if state.count == 0
            && let Some(cookie) = state.cookie.take()
        {
            match self.inhibitor.uninhibit(cookie) {
                Ok(()) => info!(cookie, "Display sleep allowed again"),
                Err(e) => warn!(error = %e, "Could not release display inhibition"),
            }
        }
    }
}

impl std::fmt::Debug for KeepAliveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepAliveRequest")
            .field("count", &self.active_count())
            .finish()
    }
}

/// One outstanding keep-alive request; released on drop
#[derive(Debug)]
pub struct KeepAliveGuard {
    request: KeepAliveRequest,
}

impl Drop for KeepAliveGuard {
    fn drop(&mut self) {
        self.request.request_release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingInhibitor {
        inhibits: AtomicU32,
        uninhibits: AtomicU32,
    }

    impl DisplayInhibitor for CountingInhibitor {
        fn inhibit(&self) -> Result<u32, String> {
            Ok(self.inhibits.fetch_add(1, Ordering::SeqCst) + 100)
        }

        fn uninhibit(&self, _cookie: u32) -> Result<(), String> {
            self.uninhibits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn inhibits_once_for_nested_requests() {
        let inhibitor = Arc::new(CountingInhibitor::default());
        let request = KeepAliveRequest::new(inhibitor.clone());

        let first = request.request_active();
        let second = request.request_active();
        assert_eq!(request.active_count(), 2);
        assert_eq!(inhibitor.inhibits.load(Ordering::SeqCst), 1);

        drop(first);
        assert_eq!(inhibitor.uninhibits.load(Ordering::SeqCst), 0);
        drop(second);
        assert_eq!(request.active_count(), 0);
        assert_eq!(inhibitor.uninhibits.load(Ordering::SeqCst), 1);
    }

    struct BrokenInhibitor;

    impl DisplayInhibitor for BrokenInhibitor {
        fn inhibit(&self) -> Result<u32, String> {
            Err("no screensaver".into())
        }

        fn uninhibit(&self, _cookie: u32) -> Result<(), String> {
            panic!("nothing was inhibited");
        }
    }

    #[test]
    fn failed_inhibit_still_counts() {
        let request = KeepAliveRequest::new(Arc::new(BrokenInhibitor));
        let guard = request.request_active();
        assert_eq!(request.active_count(), 1);
        drop(guard);
        assert_eq!(request.active_count(), 0);
    }
}
