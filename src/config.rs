//! Configuration file support for lifelog
//!
//! Reads from .lifelog/config.toml, then applies environment overrides.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::events::{EventMapper, LabelScheme};
use crate::github::{RepoRef, DEFAULT_API_BASE};
use crate::tracker::DEFAULT_PAGE_SIZE;

pub const CONFIG_DIR: &str = ".lifelog";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No repository configured. Set [repo] owner/name in .lifelog/config.toml or LIFELOG_REPO=owner/repo")]
    MissingRepo,

    #[error("{0}")]
    InvalidRepo(String),

    #[error("Unknown time zone '{0}' (expected an IANA name such as Asia/Shanghai)")]
    UnknownTimezone(String),
}

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Repository that stores the records
    #[serde(default)]
    pub repo: RepoConfig,

    /// Record store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Label names for the namespace marker and each event kind
    #[serde(default)]
    pub labels: LabelScheme,

    #[serde(default)]
    pub http: HttpConfig,

    /// OAuth app settings for login and the exchange endpoint
    #[serde(default)]
    pub oauth: OAuthConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RepoConfig {
    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// Default: https://api.github.com
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            owner: None,
            name: None,
            api_base: default_api_base(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// Reference zone for "today" and streaks. Default: UTC
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Records per page for list views. Default: 20
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Per-request timeout. Default: 15
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OAuthConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    /// Prefer GITHUB_CLIENT_SECRET over writing this to disk
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Falls back to the request Origin during exchange
    #[serde(default)]
    pub redirect_uri: Option<String>,

    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    #[serde(default = "default_scope")]
    pub scope: String,

    /// Port for `lifelog serve`. Default: 3000
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path the exchange endpoint answers on
    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            scope: default_scope(),
            port: default_port(),
            endpoint_path: default_endpoint_path(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("lifelog/{}", env!("CARGO_PKG_VERSION"))
}

fn default_authorize_url() -> String {
    "https://github.com/login/oauth/authorize".to_string()
}

fn default_token_url() -> String {
    "https://github.com/login/oauth/access_token".to_string()
}

fn default_scope() -> String {
    "repo user".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_endpoint_path() -> String {
    "/api/github-auth".to_string()
}

impl Config {
    /// Load config from .lifelog/config.toml (or LIFELOG_CONFIG), then env.
    /// Returns default config if the file doesn't exist
    pub fn load() -> Self {
        let path = std::env::var_os("LIFELOG_CONFIG")
            .map(PathBuf::from)
            .or_else(Self::find_config_path);

        let mut config = path.map(|p| Self::load_from(&p)).unwrap_or_default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Parse a config file, falling back to defaults when unreadable
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("ignoring {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Apply environment-style overrides from `get`
    pub fn apply_overrides<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = value("LIFELOG_REPO") {
            match RepoRef::parse(&raw) {
                Ok(repo) => {
                    self.repo.owner = Some(repo.owner);
                    self.repo.name = Some(repo.name);
                }
                Err(e) => log::warn!("ignoring LIFELOG_REPO: {}", e),
            }
        }
        if let Some(base) = value("LIFELOG_API_BASE") {
            self.repo.api_base = base;
        }
        if let Some(tz) = value("LIFELOG_TIMEZONE") {
            self.store.timezone = tz;
        }
        if let Some(id) = value("GITHUB_CLIENT_ID") {
            self.oauth.client_id = Some(id);
        }
        if let Some(secret) = value("GITHUB_CLIENT_SECRET") {
            self.oauth.client_secret = Some(secret);
        }
        if let Some(uri) = value("GITHUB_REDIRECT_URI") {
            self.oauth.redirect_uri = Some(uri);
        }
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        find_lifelog_dir()
            .map(|dir| dir.join(CONFIG_FILE))
            .filter(|p| p.exists())
    }

    pub fn repo_ref(&self) -> Result<RepoRef, ConfigError> {
        match (&self.repo.owner, &self.repo.name) {
            (Some(owner), Some(name)) => RepoRef::parse(&format!("{}/{}", owner, name))
                .map_err(ConfigError::InvalidRepo),
            _ => Err(ConfigError::MissingRepo),
        }
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.store
            .timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.store.timezone.clone()))
    }

    pub fn mapper(&self) -> Result<EventMapper, ConfigError> {
        Ok(EventMapper::new(self.labels.clone(), self.timezone()?))
    }
}

/// Walk up from the current directory to the nearest `.lifelog` folder
pub fn find_lifelog_dir() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    let mut dir = current_dir.as_path();

    loop {
        let candidate = dir.join(CONFIG_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.repo.api_base, "https://api.github.com");
        assert_eq!(config.store.timezone, "UTC");
        assert_eq!(config.store.page_size, 20);
        assert_eq!(config.labels.namespace, "personal-blog");
        assert_eq!(config.oauth.port, 3000);
        assert_eq!(config.oauth.endpoint_path, "/api/github-auth");
        assert!(config.http.user_agent.starts_with("lifelog/"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[repo]
owner = "esther"
name = "esther.github.io"

[store]
timezone = "Asia/Shanghai"

[labels]
namespace = "journal"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.repo_ref().unwrap().slug(), "esther/esther.github.io");
        assert_eq!(config.timezone().unwrap(), chrono_tz::Asia::Shanghai);
        assert_eq!(config.labels.namespace, "journal");
        // Unset label names keep their defaults
        assert_eq!(config.labels.mood, "mood");
        assert_eq!(config.store.page_size, 20);
    }

    #[test]
    fn test_missing_repo() {
        assert!(matches!(
            Config::default().repo_ref(),
            Err(ConfigError::MissingRepo)
        ));
    }

    #[test]
    fn test_unknown_timezone() {
        let mut config = Config::default();
        config.store.timezone = "Mars/Olympus".to_string();
        assert!(matches!(
            config.timezone(),
            Err(ConfigError::UnknownTimezone(_))
        ));
        assert!(config.mapper().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LIFELOG_REPO", "owner/repo"),
            ("LIFELOG_API_BASE", "http://127.0.0.1:9000"),
            ("LIFELOG_TIMEZONE", "Europe/Berlin"),
            ("GITHUB_CLIENT_ID", "cid"),
            ("GITHUB_CLIENT_SECRET", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.repo_ref().unwrap(), RepoRef::new("owner", "repo"));
        assert_eq!(config.repo.api_base, "http://127.0.0.1:9000");
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.oauth.client_id.as_deref(), Some("cid"));
        // Blank values don't override
        assert_eq!(config.oauth.client_secret, None);
    }

    #[test]
    fn test_invalid_repo_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "LIFELOG_REPO").then(|| "nope".to_string()));
        assert!(config.repo_ref().is_err());
    }

    #[test]
    fn test_load_from_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.store.timezone, "UTC");

        let missing = Config::load_from(&dir.path().join("missing.toml"));
        assert_eq!(missing.oauth.port, 3000);
    }
}
