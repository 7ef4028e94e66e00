//! Clap derive structures for the `portal` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use portal_api::models::{ArtifactType, SubscriptionStatus};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// portal -- query the Catena-X portal backends through the cached data layer
#[derive(Debug, Parser)]
#[command(
    name = "portal",
    version,
    about = "Query the Catena-X portal marketplace, subscriptions, and semantic hub",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "PORTAL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Portal backend base URL (overrides config)
    #[arg(long, global = true)]
    pub marketplace_url: Option<String>,

    /// Semantic service base URL (overrides config)
    #[arg(long, global = true)]
    pub semantic_url: Option<String>,

    /// Language for localized app details
    #[arg(long, short = 'l', env = "PORTAL_LANG", default_value = "en", global = true)]
    pub lang: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse marketplace apps
    #[command(alias = "a")]
    Apps(AppsArgs),

    /// Manage subscriptions to your provided apps
    #[command(alias = "sub")]
    Subscription(SubscriptionArgs),

    /// Browse and upload semantic models
    #[command(alias = "m")]
    Models(ModelsArgs),

    /// Inspect and initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Apps ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AppsArgs {
    #[command(subcommand)]
    pub command: AppsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AppsCommand {
    /// Apps currently offered on the marketplace
    Active,

    /// Your favourite apps
    Favorites,

    /// Apps your company provides
    Provided,

    /// Subscription status of your company's app subscriptions
    Status,

    /// Full details of one app
    Details {
        /// App id
        id: String,
    },
}

// ── Subscription ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SubscriptionArgs {
    #[command(subcommand)]
    pub command: SubscriptionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubscriptionCommand {
    /// Provider view of one customer subscription
    Show {
        app_id: String,
        subscription_id: String,
    },

    /// Subscriptions to your provided apps
    List {
        /// Restrict to one offer
        #[arg(long)]
        offer_id: Option<String>,

        /// Restrict to one status (active, pending, ...)
        #[arg(long)]
        status: Option<SubscriptionStatus>,

        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value_t = 15)]
        size: u32,
    },

    /// Set the tenant URL of a subscription and show the refreshed detail
    SetTenantUrl {
        app_id: String,
        subscription_id: String,
        url: String,
    },
}

// ── Models ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ModelsCommand {
    /// One page of semantic models
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,

        /// Namespace prefix filter
        #[arg(long)]
        namespace: Option<String>,

        /// Status filter (repeatable)
        #[arg(long)]
        status: Vec<String>,

        /// Name filter
        #[arg(long)]
        name: Option<String>,

        /// Which name to match (e.g. `_DESCRIPTION_`)
        #[arg(long)]
        name_type: Option<String>,
    },

    /// One model by URN
    Get { urn: String },

    /// Download a model artifact
    Artifact {
        urn: String,

        /// Artifact kind
        #[arg(long = "type", short = 't')]
        artifact: ArtifactType,

        /// Write to this file instead of stdout
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// Upload a turtle document
    Upload {
        /// Turtle file
        path: PathBuf,

        /// Model type (e.g. BAMM)
        #[arg(long = "type", default_value = "BAMM")]
        model_type: String,

        /// Initial status
        #[arg(long, default_value = "DRAFT")]
        status: String,
    },

    /// The model list bundled with the portal
    Static,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the given backend URLs
    Init {
        #[arg(long)]
        marketplace_url: String,

        #[arg(long)]
        semantic_url: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration (token redacted)
    Show,

    /// Print the config file path
    Path,

    /// Store a bearer token, read from stdin, in the system keyring
    SetToken,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
