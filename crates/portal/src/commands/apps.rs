//! Marketplace app command handlers.

use portal_api::models::{AppDetails, AppMarketplaceApp, SubscriptionStatusItem};
use portal_core::apis::marketplace::AppDetailsArgs;
use tabled::Tabled;

use crate::cli::{AppsArgs, AppsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&AppMarketplaceApp> for AppRow {
    fn from(a: &AppMarketplaceApp) -> Self {
        Self {
            id: a.id.clone(),
            title: a.title.clone(),
            provider: a.provider.clone(),
            status: a.status.map(|s| s.label().to_owned()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "App")]
    app_id: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn detail(d: &AppDetails) -> String {
    output::detail_block(&[
        ("ID", d.app.id.clone()),
        ("Title", d.app.title.clone()),
        ("Provider", d.app.provider.clone()),
        ("Provider URI", d.provider_uri.clone()),
        ("Contact", d.contact_email.clone()),
        ("Price", d.app.price.clone()),
        ("Use cases", d.app.use_cases.join(", ")),
        ("Languages", d.languages.join(", ")),
        ("Tags", d.tags.join(", ")),
        ("Subscribed", d.is_subscribed.clone()),
        ("Description", d.long_description.clone()),
    ])
}

fn list_apps(apps: &[AppMarketplaceApp], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(global.output, apps, |a| AppRow::from(a), |a| a.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(session: &Session, args: AppsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (store, api) = (&session.store, &session.apis.marketplace);
    match args.command {
        AppsCommand::Active => list_apps(&store.query(&api.fetch_active_apps, ()).await?, global),

        AppsCommand::Provided => {
            list_apps(&store.query(&api.fetch_provided_apps, ()).await?, global)
        }

        AppsCommand::Favorites => {
            let ids = store.query(&api.fetch_favorite_apps, ()).await?;
            let out = output::render_single(
                global.output,
                &*ids,
                |ids| ids.join("\n"),
                |ids| ids.join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Status => {
            let items = store.query(&api.fetch_subscription_status, ()).await?;
            let out = output::render_list(
                global.output,
                &items,
                |i: &SubscriptionStatusItem| StatusRow {
                    app_id: i.app_id.clone(),
                    status: i.offer_subscription_status.label().to_owned(),
                },
                |i| format!("{}\t{}", i.app_id, i.offer_subscription_status),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Details { id } => {
            let details = store
                .query(&api.fetch_app_details, AppDetailsArgs::new(id, global.lang.clone()))
                .await?;
            let out = output::render_single(global.output, &*details, detail, |d| d.app.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
