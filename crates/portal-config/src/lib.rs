//! Configuration for the portal data layer.
//!
//! TOML file, `PORTAL_` environment overrides, bearer token resolution
//! (env var + keyring + plaintext), and translation into
//! `portal_core::PortalConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use portal_core::{CachePolicy, PortalConfig, TlsVerification};

/// Keyring service name; the token is stored under the `token` user.
pub const KEYRING_SERVICE: &str = "portal";
const KEYRING_USER: &str = "token";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub http: Http,

    #[serde(default)]
    pub cache: Cache,

    #[serde(default)]
    pub auth: Auth,
}

/// Backend base URLs. Both must be set before a store can be built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Environment {
    /// Portal backend serving marketplace and subscription endpoints.
    pub marketplace_api_base: Option<String>,

    /// Semantic service root; the hub API path is appended.
    pub semantic_api_base: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Http {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Cache {
    /// Seconds an unused entry is kept before eviction.
    #[serde(default = "default_keep_unused")]
    pub keep_unused_data_for: u64,

    #[serde(default)]
    pub refetch_on_focus: bool,

    #[serde(default)]
    pub refetch_on_reconnect: bool,

    /// Refetch on subscribe when data is at least this many seconds old.
    pub refetch_on_mount_or_arg_change: Option<u64>,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            keep_unused_data_for: default_keep_unused(),
            refetch_on_focus: false,
            refetch_on_reconnect: false,
            refetch_on_mount_or_arg_change: None,
        }
    }
}

fn default_keep_unused() -> u64 {
    60
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Auth {
    /// Bearer token (plaintext; prefer the keyring or `token_env`).
    pub token: Option<String>,

    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Look the token up in the system keyring.
    #[serde(default = "default_true")]
    pub keyring: bool,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            token: None,
            token_env: default_token_env(),
            keyring: true,
        }
    }
}

fn default_token_env() -> String {
    "PORTAL_ACCESS_TOKEN".into()
}
fn default_true() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "catena-x", "portal").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("portal");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path` (if present), then
/// `PORTAL_*` variables with `__` separating sections
/// (`PORTAL_CACHE__REFETCH_ON_FOCUS=true`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PORTAL_").split("__"))
        .extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

/// Store the bearer token in the system keyring.
pub fn store_token(token: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?.set_password(token)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the bearer token: `token_env` variable, then the keyring, then
/// the plaintext `auth.token`. `None` means requests go out anonymously.
pub fn resolve_token(auth: &Auth) -> Option<SecretString> {
    if let Ok(val) = std::env::var(&auth.token_env) {
        if !val.trim().is_empty() {
            return Some(SecretString::from(val));
        }
    }

    if auth.keyring {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER) {
            if let Ok(secret) = entry.get_password() {
                return Some(SecretString::from(secret));
            }
        }
    }

    auth.token.clone().map(SecretString::from)
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_base(field: &str, raw: Option<&str>) -> Result<Url, ConfigError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(field, "not set"))?;
    let url = Url::parse(raw).map_err(|e| invalid(field, format!("{e}: {raw}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(field, format!("scheme must be http or https: {raw}")));
    }
    Ok(url)
}

impl Cache {
    pub fn to_policy(&self) -> CachePolicy {
        CachePolicy {
            keep_unused_data_for: Duration::from_secs(self.keep_unused_data_for),
            refetch_on_focus: self.refetch_on_focus,
            refetch_on_reconnect: self.refetch_on_reconnect,
            refetch_on_mount_or_arg_change: self.refetch_on_mount_or_arg_change.map(Duration::from_secs),
        }
    }
}

impl Http {
    pub fn tls(&self) -> TlsVerification {
        if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsVerification::CustomCa(ca.clone())
        } else {
            TlsVerification::SystemDefaults
        }
    }
}

impl Config {
    /// Check every field without resolving credentials.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_urls().map(|_| ())
    }

    /// Validate and build the runtime config, resolving the token.
    pub fn to_portal_config(&self) -> Result<PortalConfig, ConfigError> {
        let (marketplace_url, semantic_url) = self.base_urls()?;
        Ok(PortalConfig {
            marketplace_url,
            semantic_url,
            token: resolve_token(&self.auth),
            tls: self.http.tls(),
            timeout: Duration::from_secs(self.http.timeout),
            cache: self.cache.to_policy(),
        })
    }

    fn base_urls(&self) -> Result<(Url, Url), ConfigError> {
        let marketplace_url = parse_base(
            "environment.marketplace_api_base",
            self.environment.marketplace_api_base.as_deref(),
        )?;
        let semantic_url = parse_base(
            "environment.semantic_api_base",
            self.environment.semantic_api_base.as_deref(),
        )?;
        if self.http.timeout == 0 {
            return Err(invalid("http.timeout", "must be at least 1 second"));
        }
        if let Some(ref ca) = self.http.ca_cert {
            if !self.http.insecure && !ca.is_file() {
                return Err(invalid(
                    "http.ca_cert",
                    format!("no such file: {}", ca.display()),
                ));
            }
        }
        Ok((marketplace_url, semantic_url))
    }
}
