//! CLI error types with miette diagnostics.
//!
//! Maps query, store, and config failures into user-facing errors with
//! help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use portal_config::ConfigError;
use portal_core::{QueryError, StoreError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const CONFIG: i32 = 78;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend: {message}")]
    #[diagnostic(
        code(portal::connection_failed),
        help("Check the backend URLs with: portal config show")
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not authorized (HTTP {status})")]
    #[diagnostic(
        code(portal::auth_failed),
        help(
            "Provide a bearer token via PORTAL_ACCESS_TOKEN,\n\
             or store one with: portal config set-token"
        )
    )]
    AuthFailed { status: u16 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {resource}")]
    #[diagnostic(code(portal::not_found))]
    NotFound { resource: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Request failed ({kind}): {message}")]
    #[diagnostic(code(portal::api_error))]
    Api { kind: &'static str, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(portal::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(portal::config),
        help("Create a config file with: portal config init --marketplace-url <URL> --semantic-url <URL>")
    )]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(portal::store))]
    Store(#[from] StoreError),

    #[error("Config file already exists at {path}")]
    #[diagnostic(code(portal::config_exists), help("Pass --force to overwrite it."))]
    ConfigExists { path: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(portal::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Config(_) | Self::Store(_) | Self::ConfigExists { .. } => exit_code::CONFIG,
            Self::Api { .. } | Self::Io(_) | Self::Render(_) => exit_code::GENERAL,
        }
    }
}

// ── QueryError → CliError mapping ───────────────────────────────────

impl From<QueryError> for CliError {
    fn from(err: QueryError) -> Self {
        let kind = err.kind();
        match err {
            QueryError::Network { message } => CliError::ConnectionFailed { message },
            QueryError::HttpStatus { status, .. } if status == 401 || status == 403 => {
                CliError::AuthFailed { status }
            }
            QueryError::HttpStatus { status: 404, message } => CliError::NotFound {
                resource: if message.is_empty() {
                    "the requested resource".into()
                } else {
                    message
                },
            },
            QueryError::Validation { field, reason } => CliError::Validation { field, reason },
            QueryError::HttpStatus { message, .. }
            | QueryError::Decode { message }
            | QueryError::Credentials { message }
            | QueryError::Config { message }
            | QueryError::Aborted { message } => CliError::Api { kind, message },
        }
    }
}

impl From<portal_api::Error> for CliError {
    fn from(err: portal_api::Error) -> Self {
        QueryError::from(err).into()
    }
}
