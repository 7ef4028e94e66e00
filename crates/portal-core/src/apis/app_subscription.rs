// App subscription management slice.
//
// Subscription details are tagged per `(app, subscription)` pair so a
// tenant URL update refetches exactly the detail view it changed.

use portal_api::models::{
    ProvidedSubscriptions, SubscriptionDetail, SubscriptionStatus, TenantUrlUpdate,
    validate_tenant_url,
};
use portal_api::{HttpClient, Request};
use serde::Serialize;

use crate::cache::Tag;
use crate::config::CachePolicy;
use crate::endpoint::{MutationDef, MutationEndpoint, QueryDef, QueryEndpoint};
use crate::error::StoreError;
use crate::slice::ApiSlice;

pub const REDUCER_PATH: &str = "rtk/appSubscription";

pub const SUBSCRIPTION_DETAIL_TAG: &str = "SubscriptionDetail";
pub const SUBSCRIPTIONS_TAG: &str = "Subscriptions";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetailArgs {
    pub app_id: String,
    pub subscription_id: String,
}

impl SubscriptionDetailArgs {
    pub fn new(app_id: impl Into<String>, subscription_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            subscription_id: subscription_id.into(),
        }
    }

    /// Tag identifying this subscription's detail view.
    pub fn tag(&self) -> Tag {
        Tag::with_id(
            SUBSCRIPTION_DETAIL_TAG,
            format!("{}/{}", self.app_id, self.subscription_id),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantUrlArgs {
    #[serde(flatten)]
    pub subscription: SubscriptionDetailArgs,
    pub url: String,
}

/// Page of subscriptions to the caller's provided apps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionListArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<SubscriptionStatus>,
    pub page: u32,
    pub size: u32,
}

impl Default for SubscriptionListArgs {
    fn default() -> Self {
        Self {
            offer_id: None,
            status_id: None,
            page: 0,
            size: 15,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppSubscriptionApi {
    slice: ApiSlice,
    pub fetch_subscription_detail: QueryEndpoint<SubscriptionDetailArgs, SubscriptionDetail>,
    pub fetch_subscriptions: QueryEndpoint<SubscriptionListArgs, ProvidedSubscriptions>,
    pub update_tenant_url: MutationEndpoint<TenantUrlArgs, ()>,
}

impl AppSubscriptionApi {
    pub fn new(client: HttpClient, policy: CachePolicy) -> Result<Self, StoreError> {
        let mut b = ApiSlice::builder(REDUCER_PATH, client)?;
        b.policy(policy);

        let fetch_subscription_detail = b.query(
            "fetchSubscriptionDetail",
            QueryDef::json(|args: &SubscriptionDetailArgs| {
                Ok(Request::get(format!(
                    "/api/apps/{}/subscription/{}/provider",
                    args.app_id, args.subscription_id
                )))
            })
            .provides_tags(|args, _| vec![args.tag()]),
        )?;

        let fetch_subscriptions = b.query(
            "fetchSubscriptions",
            QueryDef::json(|args: &SubscriptionListArgs| {
                Request::get("/api/apps/provided/subscription-status").query_from(args)
            })
            .provides_tags(|_, _| vec![Tag::kind(SUBSCRIPTIONS_TAG)]),
        )?;

        let update_tenant_url = b.mutation(
            "updateTenantUrl",
            MutationDef::raw(
                |args: &TenantUrlArgs| {
                    let body = serde_json::to_value(TenantUrlUpdate {
                        url: args.url.trim().to_owned(),
                    })
                    .map_err(|e| portal_api::Error::Validation {
                        field: "tenantUrl".into(),
                        reason: e.to_string(),
                    })?;
                    Ok(Request::put(format!(
                        "/api/apps/{}/subscription/{}/tenantUrl",
                        args.subscription.app_id, args.subscription.subscription_id
                    ))
                    .json(body))
                },
                |_| Ok(()),
            )
            .validate(|args| validate_tenant_url(&args.url).map(|_| ()))
            .invalidates_tags(|args, result| match result {
                Ok(()) => vec![args.subscription.tag()],
                Err(_) => Vec::new(),
            }),
        )?;

        Ok(Self {
            slice: b.build(),
            fetch_subscription_detail,
            fetch_subscriptions,
            update_tenant_url,
        })
    }

    pub fn slice(&self) -> &ApiSlice {
        &self.slice
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn detail_tag_names_app_and_subscription() {
        let args = SubscriptionDetailArgs::new("app-1", "sub-9");
        assert_eq!(args.tag().to_string(), "SubscriptionDetail:app-1/sub-9");
    }

    #[test]
    fn tenant_url_args_flatten() {
        let args = TenantUrlArgs {
            subscription: SubscriptionDetailArgs::new("a", "s"),
            url: "https://t.example.com".into(),
        };
        assert_eq!(
            serde_json::to_value(args).unwrap(),
            serde_json::json!({ "appId": "a", "subscriptionId": "s", "url": "https://t.example.com" })
        );
    }
}
