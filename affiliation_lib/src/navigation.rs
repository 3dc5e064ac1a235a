//! Route targets and the one-shot login redirect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub const LOGIN_ROUTE: &str = "/auth/login/";
pub const ROOT_ROUTE: &str = "/";

/// Whatever can move the user to another page.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Sends the user to the login page at most once until reset.
///
/// Several requests can come back `401` at the same moment; only the first
/// one navigates.
#[derive(Debug, Default)]
pub struct RedirectGuard {
    fired: AtomicBool,
}

impl RedirectGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigates to the login page unless that already happened.
    /// Returns whether this call did the navigating.
    pub fn redirect_to_login(&self, navigator: &dyn Navigator) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            tracing::debug!("login redirect already issued");
            return false;
        }
        tracing::info!("session rejected, redirecting to {}", LOGIN_ROUTE);
        navigator.navigate(LOGIN_ROUTE);
        true
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Arms the guard again, after a fresh login.
    pub fn reset(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }
}

/// Records every navigation instead of performing it.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        self.visited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(target.to_string());
    }
}
