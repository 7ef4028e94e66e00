//! Command dispatch: bridges CLI args -> store queries -> output formatting.

pub mod apps;
pub mod config_cmd;
pub mod models;
pub mod subscription;

use portal_core::{PortalApis, Store};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Backend clients and the store every handler reads through.
pub struct Session {
    pub apis: PortalApis,
    pub store: Store,
}

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Apps(args) => apps::handle(session, args, global).await,
        Command::Subscription(args) => subscription::handle(session, args, global).await,
        Command::Models(args) => models::handle(session, args, global).await,
        // Handled before a session exists
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
