// App marketplace slice.

use portal_api::models::{AppDetails, AppMarketplaceApp, SubscriptionStatusItem};
use portal_api::{HttpClient, Request};
use serde::Serialize;

use crate::config::CachePolicy;
use crate::endpoint::{QueryDef, QueryEndpoint};
use crate::error::StoreError;
use crate::slice::ApiSlice;

pub const REDUCER_PATH: &str = "rtk/apps/marketplace";

/// Arguments of `fetchAppDetails`. The language is part of the cache key,
/// so switching language never serves details in the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AppDetailsArgs {
    pub id: String,
    pub lang: String,
}

impl AppDetailsArgs {
    pub fn new(id: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lang: lang.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MarketplaceApi {
    slice: ApiSlice,
    pub fetch_app_details: QueryEndpoint<AppDetailsArgs, AppDetails>,
    pub fetch_active_apps: QueryEndpoint<(), Vec<AppMarketplaceApp>>,
    pub fetch_favorite_apps: QueryEndpoint<(), Vec<String>>,
    pub fetch_subscription_status: QueryEndpoint<(), Vec<SubscriptionStatusItem>>,
    pub fetch_provided_apps: QueryEndpoint<(), Vec<AppMarketplaceApp>>,
}

impl MarketplaceApi {
    pub fn new(client: HttpClient, policy: CachePolicy) -> Result<Self, StoreError> {
        let mut b = ApiSlice::builder(REDUCER_PATH, client)?;
        b.policy(policy);

        let fetch_app_details = b.query(
            "fetchAppDetails",
            QueryDef::json(|args: &AppDetailsArgs| {
                Ok(Request::get(format!("/api/apps/{}", args.id)).query("lang", &args.lang))
            }),
        )?;
        let fetch_active_apps = b.query(
            "fetchActiveApps",
            QueryDef::json(|_: &()| Ok(Request::get("/api/apps/active"))),
        )?;
        let fetch_favorite_apps = b.query(
            "fetchFavoriteApps",
            QueryDef::json(|_: &()| Ok(Request::get("/api/apps/favourites"))),
        )?;
        let fetch_subscription_status = b.query(
            "fetchSubscriptionStatus",
            QueryDef::json(|_: &()| Ok(Request::get("/api/apps/subscribed/subscription-status"))),
        )?;
        let fetch_provided_apps = b.query(
            "fetchProvidedApps",
            QueryDef::json(|_: &()| Ok(Request::get("/api/apps/provided"))),
        )?;

        Ok(Self {
            slice: b.build(),
            fetch_app_details,
            fetch_active_apps,
            fetch_favorite_apps,
            fetch_subscription_status,
            fetch_provided_apps,
        })
    }

    pub fn slice(&self) -> &ApiSlice {
        &self.slice
    }
}
