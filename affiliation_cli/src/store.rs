//! Session persistence for the CLI: one sealed session token in a file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use affiliation_lib::{DashboardConfig, Navigator, Session, SessionCookie, LOGIN_ROUTE};
use anyhow::{Context, Result};

const STATE_DIR: &str = ".affiliation";
const SESSION_FILE: &str = "session";
const SECRET_FILE: &str = "secret";

fn state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(STATE_DIR)
}

pub struct SessionStore {
    path: PathBuf,
    cookie: SessionCookie,
}

impl SessionStore {
    pub fn new(path: PathBuf, cookie: SessionCookie) -> Self {
        Self { path, cookie }
    }

    /// Uses the configured file and secret, falling back to `~/.affiliation/`.
    /// A missing secret file is created with a fresh random secret.
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let path = config
            .session_file
            .clone()
            .unwrap_or_else(|| state_dir().join(SESSION_FILE));
        let cookie = match config.session_cookie() {
            Some(cookie) => cookie,
            None => SessionCookie::new(load_or_create_secret(&state_dir().join(SECRET_FILE))?)
                .with_max_age(Duration::from_secs(config.session_max_age_secs)),
        };
        Ok(Self::new(path, cookie))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, if present, untampered and not past its max age.
    pub fn load(&self) -> Option<Session> {
        let token = std::fs::read_to_string(&self.path).ok()?;
        match self.cookie.open(&token) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("discarding stored session: {}", e);
                None
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let token = self.cookie.seal(session)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(&self.path, token)
            .with_context(|| format!("writing session to {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}

fn load_or_create_secret(path: &Path) -> Result<String> {
    if let Ok(secret) = std::fs::read_to_string(path) {
        if !secret.trim().is_empty() {
            return Ok(secret.trim().to_string());
        }
    }
    let secret = SessionCookie::generate_secret();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, &secret)
        .with_context(|| format!("writing secret to {}", path.display()))?;
    Ok(secret)
}

/// Terminal stand-in for a browser redirect: a rejected session is dropped
/// and the user is told to log in again.
pub struct CliNavigator {
    session_file: PathBuf,
}

impl CliNavigator {
    pub fn new(session_file: PathBuf) -> Self {
        Self { session_file }
    }
}

impl Navigator for CliNavigator {
    fn navigate(&self, target: &str) {
        if target == LOGIN_ROUTE {
            if let Err(e) = std::fs::remove_file(&self.session_file) {
                tracing::debug!("no session file to remove: {}", e);
            }
            eprintln!("Session expired or rejected. Run `affiliation login` to sign in again.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "T".to_string(),
            refresh_token: "R".to_string(),
            user_id: "U".to_string(),
            email: Some("a@b.com".to_string()),
        }
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(
            dir.path().join("nested").join("session"),
            SessionCookie::new("secret"),
        );
        assert!(store.load().is_none());

        store.save(&session()).unwrap();
        assert_eq!(store.load(), Some(session()));

        store.clear().unwrap();
        assert!(store.load().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn tampered_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        SessionStore::new(path.clone(), SessionCookie::new("one"))
            .save(&session())
            .unwrap();
        assert!(SessionStore::new(path, SessionCookie::new("two"))
            .load()
            .is_none());
    }

    #[test]
    fn secret_is_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        let first = load_or_create_secret(&path).unwrap();
        let second = load_or_create_secret(&path).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn navigator_drops_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        std::fs::write(&path, "token").unwrap();
        CliNavigator::new(path.clone()).navigate(LOGIN_ROUTE);
        assert!(!path.exists());
    }
}
