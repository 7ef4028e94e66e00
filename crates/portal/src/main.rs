mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use portal_core::PortalApis;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::commands::Session;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need backend clients
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "portal", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let session = connect(&cli.global)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &session, &cli.global).await
        }
    }
}

/// Resolve config, build the backend clients, and assemble the store.
fn connect(global: &GlobalOpts) -> Result<Session, CliError> {
    let cfg = commands::config_cmd::resolve(global)?;
    let portal = cfg.to_portal_config()?;
    let apis = PortalApis::connect(&portal)?;
    let store = apis.store_builder(&global.lang).build()?;
    Ok(Session { apis, store })
}
