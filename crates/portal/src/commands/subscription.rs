//! App subscription command handlers.

use std::time::Duration;

use portal_api::models::{CompanySubscriptionStatus, SubscriptionContent, SubscriptionDetail};
use portal_core::apis::app_subscription::{
    SubscriptionDetailArgs, SubscriptionListArgs, TenantUrlArgs,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{debug, warn};

use crate::cli::{GlobalOpts, OutputFormat, SubscriptionArgs, SubscriptionCommand};
use crate::error::CliError;
use crate::output;

use super::Session;

/// How long to wait for the detail view to refresh after an update.
const REFRESH_WAIT: Duration = Duration::from_secs(30);

#[derive(Tabled)]
struct SubscriptionRow {
    #[tabled(rename = "Offer")]
    offer: String,
    #[tabled(rename = "Company")]
    company: String,
    #[tabled(rename = "Subscription")]
    subscription_id: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl SubscriptionRow {
    fn new(offer: &SubscriptionContent, s: &CompanySubscriptionStatus) -> Self {
        Self {
            offer: offer.offer_name.clone().unwrap_or_else(|| offer.offer_id.clone()),
            company: s.company_name.clone(),
            subscription_id: s.subscription_id.clone(),
            status: s.offer_subscription_status.label().to_owned(),
        }
    }
}

fn detail(d: &SubscriptionDetail) -> String {
    output::detail_block(&[
        ("ID", d.id.clone()),
        ("Name", d.name.clone().unwrap_or_default()),
        ("Customer", d.customer.clone().unwrap_or_default()),
        ("BPN", d.bpn.clone().unwrap_or_default()),
        ("Contact", d.contact.join(", ")),
        (
            "Status",
            d.offer_subscription_status
                .map(|s| s.label().to_owned())
                .unwrap_or_default(),
        ),
        ("Tenant URL", d.tenant_url.clone().unwrap_or_default()),
        ("App instance", d.app_instance_id.clone().unwrap_or_default()),
        (
            "Technical users",
            d.technical_user_data
                .iter()
                .map(|u| u.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ])
}

fn print_detail(d: &SubscriptionDetail, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, d, detail, |d| d.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    session: &Session,
    args: SubscriptionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (store, api) = (&session.store, &session.apis.app_subscription);
    match args.command {
        SubscriptionCommand::Show {
            app_id,
            subscription_id,
        } => {
            let d = store
                .query(
                    &api.fetch_subscription_detail,
                    SubscriptionDetailArgs::new(app_id, subscription_id),
                )
                .await?;
            print_detail(&d, global)
        }

        SubscriptionCommand::List {
            offer_id,
            status,
            page,
            size,
        } => {
            let page = store
                .query(
                    &api.fetch_subscriptions,
                    SubscriptionListArgs {
                        offer_id,
                        status_id: status,
                        page,
                        size,
                    },
                )
                .await?;
            // Tables show one row per company subscription; structured
            // formats keep the page as served.
            let out = match global.output {
                OutputFormat::Table => {
                    let rows: Vec<SubscriptionRow> = page
                        .content
                        .iter()
                        .flat_map(|offer| {
                            offer
                                .company_subscription_statuses
                                .iter()
                                .map(|s| SubscriptionRow::new(offer, s))
                        })
                        .collect();
                    Table::new(rows).with(Style::rounded()).to_string()
                }
                OutputFormat::Plain => page
                    .content
                    .iter()
                    .flat_map(|offer| &offer.company_subscription_statuses)
                    .map(|s| s.subscription_id.clone())
                    .collect::<Vec<_>>()
                    .join("\n"),
                structured => {
                    output::render_single(structured, &*page, |_| String::new(), |_| String::new())?
                }
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SubscriptionCommand::SetTenantUrl {
            app_id,
            subscription_id,
            url,
        } => {
            let target = SubscriptionDetailArgs::new(app_id, subscription_id);

            // Hold the detail view open so the update's invalidation refreshes it.
            let mut detail_view = store.subscribe(&api.fetch_subscription_detail, target.clone())?;
            let before = detail_view.resolved().await?;
            debug!(previous = ?before.tenant_url, "current tenant URL");

            store
                .mutation(&api.update_tenant_url)
                .trigger(TenantUrlArgs {
                    subscription: target,
                    url,
                })
                .await?;

            let refreshed = tokio::time::timeout(REFRESH_WAIT, detail_view.resolved()).await;
            match refreshed {
                Ok(result) => print_detail(&*result?, global),
                Err(_) => {
                    warn!("subscription detail did not refresh in time");
                    print_detail(&before, global)
                }
            }
        }
    }
}
