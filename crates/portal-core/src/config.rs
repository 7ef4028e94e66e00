// ── Runtime backend configuration ──
//
// These types describe how to reach the portal backends and how long cached
// data lives. They never touch disk: the CLI resolves a `PortalConfig` from
// files, environment, and keyring, then hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy for every backend client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (local development backends).
    DangerAcceptInvalid,
}

/// Cache lifetime and refetch behavior of one API slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long an entry survives after its last subscriber leaves.
    pub keep_unused_data_for: Duration,
    /// Refetch subscribed entries when the application regains focus.
    pub refetch_on_focus: bool,
    /// Refetch subscribed entries after network connectivity returns.
    pub refetch_on_reconnect: bool,
    /// Refetch on subscribe when cached data is at least this old.
    /// `Some(Duration::ZERO)` refetches on every new subscription.
    pub refetch_on_mount_or_arg_change: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            keep_unused_data_for: Duration::from_secs(60),
            refetch_on_focus: false,
            refetch_on_reconnect: false,
            refetch_on_mount_or_arg_change: None,
        }
    }
}

/// Everything needed to build the backend clients and slices.
///
/// Built by the CLI, passed to `PortalApis::connect`.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal backend serving marketplace and app subscription endpoints.
    pub marketplace_url: Url,
    /// Semantic model hub service root.
    pub semantic_url: Url,
    /// Bearer token supplied by the identity provider, if any.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    pub cache: CachePolicy,
}
