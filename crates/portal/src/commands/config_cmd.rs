//! Config subcommand handlers and flag-aware config resolution.

use std::io::BufRead;
use std::path::PathBuf;

use portal_config::{Config, Environment};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Config file named by `--config` / `PORTAL_CONFIG`, else the platform path.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(portal_config::config_path)
}

/// Load config from file and environment, then apply CLI flag overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = portal_config::load_config_from(&config_path(global))?;
    if let Some(ref url) = global.marketplace_url {
        cfg.environment.marketplace_api_base = Some(url.clone());
    }
    if let Some(ref url) = global.semantic_url {
        cfg.environment.semantic_api_base = Some(url.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.http.timeout = timeout;
    }
    if global.insecure {
        cfg.http.insecure = true;
    }
    Ok(cfg)
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            marketplace_url,
            semantic_url,
            force,
        } => {
            let path = config_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            let cfg = Config {
                environment: Environment {
                    marketplace_api_base: Some(marketplace_url),
                    semantic_api_base: Some(semantic_url),
                },
                ..Config::default()
            };
            // Fail before writing a file the other commands can't use.
            cfg.validate()?;
            portal_config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Config written to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = resolve(global)?;
            if cfg.auth.token.is_some() {
                cfg.auth.token = Some("<redacted>".into());
            }
            let out = output::render_single(
                global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_default(),
                |c| {
                    c.environment
                        .marketplace_api_base
                        .clone()
                        .unwrap_or_default()
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config_path(global).display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetToken => {
            let mut token = String::new();
            std::io::stdin().lock().read_line(&mut token)?;
            let token = token.trim();
            if token.is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "no token on stdin".into(),
                });
            }
            portal_config::store_token(token)?;
            if !global.quiet {
                eprintln!("Token stored in the system keyring");
            }
            Ok(())
        }
    }
}
