//! Persisted login: access token and user profile
//!
//! Stored as a small JSON object under two fixed keys. Both are written and
//! cleared together; a session missing either one counts as logged out.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::config::{find_lifelog_dir, CONFIG_DIR};
use crate::oauth::TokenExchange;

pub const TOKEN_KEY: &str = "github_access_token";
pub const USER_KEY: &str = "github_user";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub user: Value,
}

impl Session {
    pub fn login(&self) -> Option<&str> {
        self.user.get("login").and_then(|v| v.as_str())
    }
}

impl From<TokenExchange> for Session {
    fn from(t: TokenExchange) -> Self {
        Self {
            access_token: t.access_token,
            user: t.user,
        }
    }
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `LIFELOG_SESSION_PATH`, else `session.json` in the nearest `.lifelog`
    /// folder, else `./.lifelog/session.json`
    pub fn locate() -> Self {
        let path = std::env::var_os("LIFELOG_SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                find_lifelog_dir()
                    .unwrap_or_else(|| PathBuf::from(CONFIG_DIR))
                    .join(SESSION_FILE)
            });
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Map::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }

    /// Current session; `None` unless both keys are present
    pub fn load(&self) -> Result<Option<Session>> {
        let mut map = self.read_map()?;
        let token = map
            .remove(TOKEN_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|t| !t.is_empty());
        let user = map.remove(USER_KEY).filter(|u| !u.is_null());

        Ok(match (token, user) {
            (Some(access_token), Some(user)) => Some(Session { access_token, user }),
            _ => None,
        })
    }

    /// Existing keys, or an empty map when the file holds no valid JSON
    fn read_map_or_discard(&self) -> Result<Map<String, Value>> {
        match self.read_map() {
            Err(SessionError::Json(e)) => {
                log::warn!("discarding corrupt session file: {}", e);
                Ok(Map::new())
            }
            other => other,
        }
    }

    /// Write both keys, keeping anything else in the file
    pub fn save(&self, session: &Session) -> Result<()> {
        let mut map = self.read_map_or_discard()?;
        map.insert(
            TOKEN_KEY.to_string(),
            Value::String(session.access_token.clone()),
        );
        map.insert(USER_KEY.to_string(), session.user.clone());
        self.write_map(&map)
    }

    /// Remove both keys. Returns whether a session existed
    pub fn clear(&self) -> Result<bool> {
        let mut map = self.read_map_or_discard()?;
        let had_token = map.remove(TOKEN_KEY).is_some();
        let had_user = map.remove(USER_KEY).is_some();
        if !had_token && !had_user && !self.path.exists() {
            return Ok(false);
        }
        if map.is_empty() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(e.into());
                }
            }
        } else {
            self.write_map(&map)?;
        }
        Ok(had_token || had_user)
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }
}
