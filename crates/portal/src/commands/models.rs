//! Semantic model command handlers.

use std::io::Write;

use portal_api::models::{FilterParams, ModelList, NewSemanticModel, SemanticModel};
use portal_core::apis::semantic_models::ArtifactArgs;
use tabled::Tabled;

use crate::cli::{GlobalOpts, ModelsArgs, ModelsCommand};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "URN")]
    urn: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Type")]
    model_type: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&SemanticModel> for ModelRow {
    fn from(m: &SemanticModel) -> Self {
        Self {
            urn: m.urn.clone(),
            name: m.name.clone(),
            version: m.version.clone(),
            model_type: m.model_type.clone(),
            status: m.status.clone(),
        }
    }
}

fn detail(m: &SemanticModel) -> String {
    output::detail_block(&[
        ("URN", m.urn.clone()),
        ("Name", m.name.clone()),
        ("Version", m.version.clone()),
        ("Type", m.model_type.clone()),
        ("Status", m.status.clone()),
    ])
}

fn print_page(list: &ModelList, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(global.output, &list.items, |m| ModelRow::from(m), |m| m.urn.clone())?;
    output::print_output(&out, global.quiet);
    if !global.quiet && matches!(global.output, crate::cli::OutputFormat::Table) {
        eprintln!(
            "page {} of {} ({} models)",
            list.current_page + 1,
            list.total_pages.max(1),
            list.total_items
        );
    }
    Ok(())
}

pub async fn handle(session: &Session, args: ModelsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (store, api) = (&session.store, &session.apis.semantic_models);
    match args.command {
        ModelsCommand::List {
            page,
            page_size,
            namespace,
            status,
            name,
            name_type,
        } => {
            let filters = FilterParams {
                page,
                page_size,
                namespace_filter: namespace,
                status,
                name_filter: name,
                name_type,
            };
            print_page(&*store.query(&api.fetch_models, filters).await?, global)
        }

        ModelsCommand::Get { urn } => {
            let model = store.query(&api.fetch_model_by_id, urn).await?;
            let out = output::render_single(global.output, &*model, detail, |m| m.urn.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModelsCommand::Artifact {
            urn,
            artifact,
            file,
        } => {
            let bytes = store
                .query(&api.fetch_artifact, ArtifactArgs { id: urn, artifact })
                .await?;
            match file {
                Some(path) => {
                    std::fs::write(&path, &bytes[..])?;
                    if !global.quiet {
                        eprintln!("Wrote {} bytes to {}", bytes.len(), path.display());
                    }
                }
                None => std::io::stdout().lock().write_all(&bytes)?,
            }
            Ok(())
        }

        ModelsCommand::Upload {
            path,
            model_type,
            status,
        } => {
            let model = std::fs::read_to_string(&path)?;
            if model.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "path".into(),
                    reason: format!("{} is empty", path.display()),
                });
            }
            let created = store
                .mutation(&api.post_semantic_model)
                .trigger(NewSemanticModel {
                    model,
                    model_type,
                    status,
                })
                .await?;
            let out = output::render_single(global.output, &*created, detail, |m| m.urn.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModelsCommand::Static => {
            let list = session.apis.semantic_hub.get_static_models().await?;
            print_page(&list, global)
        }
    }
}
