//! Client configuration.
//!
//! A `ClientConfig` carries the login credentials, the API base URL, the
//! retry bound and transport options. It can be built in code, read from
//! `AUTHRELAY_*` environment variables, or loaded from
//! `~/.config/authrelay/config.json`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::{ClientError, Result};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "authrelay";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API base URL used when none is configured
pub const DEFAULT_API_URL: &str = "https://api.example.com/v1";

/// Network attempts per request, the first one included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_LOGIN: &str = "AUTHRELAY_LOGIN";
const ENV_PASSWORD: &str = "AUTHRELAY_PASSWORD";
const ENV_API: &str = "AUTHRELAY_API";
const ENV_MAX_ATTEMPTS: &str = "AUTHRELAY_MAX_ATTEMPTS";
const ENV_TIMEOUT_SECS: &str = "AUTHRELAY_TIMEOUT_SECS";

/// Login and password sent to the login endpoint.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub api: String,
    pub max_attempts: u32,
    pub timeout_secs: u64,
    /// Headers the transport attaches to every request, raw ones included
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            api: DEFAULT_API_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(login, password),
            ..Self::default()
        }
    }

    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Reject configurations the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.credentials.login.trim().is_empty() {
            return Err(ClientError::InvalidConfiguration("login is required".to_string()));
        }
        if self.credentials.password.is_empty() {
            return Err(ClientError::InvalidConfiguration("password is required".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(ClientError::InvalidConfiguration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !(self.api.starts_with("http://") || self.api.starts_with("https://")) {
            return Err(ClientError::InvalidConfiguration(format!(
                "api must be an http(s) URL, got {:?}",
                self.api
            )));
        }
        Ok(())
    }

    /// Join `uri` onto the base URL unless it is already absolute.
    pub fn url_for(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return uri.to_string();
        }
        let base = self.api.trim_end_matches('/');
        let path = uri.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Overlay `AUTHRELAY_*` environment variables onto this config.
    pub fn merge_env(self) -> Result<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(login) = var(ENV_LOGIN) {
            self.credentials.login = login;
        }
        if let Some(password) = var(ENV_PASSWORD) {
            self.credentials.password = password;
        }
        if let Some(api) = var(ENV_API) {
            self.api = api;
        }
        if let Some(raw) = var(ENV_MAX_ATTEMPTS) {
            self.max_attempts = raw.trim().parse().map_err(|_| {
                ClientError::InvalidConfiguration(format!("{} must be a number, got {:?}", ENV_MAX_ATTEMPTS, raw))
            })?;
        }
        if let Some(raw) = var(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                ClientError::InvalidConfiguration(format!("{} must be a number, got {:?}", ENV_TIMEOUT_SECS, raw))
            })?;
        }
        Ok(self)
    }

    /// Load from a JSON file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClientError::InvalidConfiguration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load from the default config location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ClientError::InvalidConfiguration("Could not find config directory".to_string())
        })?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
