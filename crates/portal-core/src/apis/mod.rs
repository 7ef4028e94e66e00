// ── Portal API slices ──
//
// The concrete slices of the portal and the store they are assembled into.

pub mod app_subscription;
pub mod marketplace;
pub mod semantic_models;

use std::sync::Arc;

use portal_api::{
    Anonymous, BearerToken, HttpClient, SemanticHubClient, SharedTokenProvider, TlsMode,
    TransportConfig,
};
use tracing::debug;

pub use app_subscription::AppSubscriptionApi;
pub use marketplace::MarketplaceApi;
pub use semantic_models::SemanticModelsApi;

use crate::config::{CachePolicy, PortalConfig, TlsVerification};
use crate::error::StoreError;
use crate::feature::{ERROR_KEY, ErrorState, LANGUAGE_KEY, LanguageState};
use crate::store::{StoreBuilder, TracingMiddleware};

/// Every portal slice, built against the configured backends.
#[derive(Clone, Debug)]
pub struct PortalApis {
    pub marketplace: MarketplaceApi,
    pub app_subscription: AppSubscriptionApi,
    pub semantic_models: SemanticModelsApi,
    /// Uncached access to the semantic hub (bundled model list).
    pub semantic_hub: SemanticHubClient,
}

impl PortalApis {
    /// Build clients for both backends and define the slices on them.
    pub fn connect(config: &PortalConfig) -> Result<Self, StoreError> {
        let transport = TransportConfig {
            tls: match &config.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: config.timeout,
        };
        let auth: SharedTokenProvider = match &config.token {
            Some(token) => Arc::new(BearerToken::new(token.clone())),
            None => Arc::new(Anonymous),
        };

        debug!(
            marketplace = %config.marketplace_url,
            semantic = %config.semantic_url,
            authenticated = config.token.is_some(),
            "building backend clients"
        );
        let portal = HttpClient::new(config.marketplace_url.as_str(), &transport, Arc::clone(&auth))?;
        let semantic = HttpClient::new(config.semantic_url.as_str(), &transport, auth)?;
        Self::from_clients(&portal, &semantic, &config.cache)
    }

    /// Define the slices on existing clients. `semantic` is the semantic
    /// service root; the hub API path is appended here.
    pub fn from_clients(
        portal: &HttpClient,
        semantic: &HttpClient,
        policy: &CachePolicy,
    ) -> Result<Self, StoreError> {
        let semantic_hub = SemanticHubClient::for_service(semantic)?;
        Ok(Self {
            marketplace: MarketplaceApi::new(portal.clone(), policy.clone())?,
            app_subscription: AppSubscriptionApi::new(portal.clone(), policy.clone())?,
            semantic_models: SemanticModelsApi::new(semantic_hub.http().clone(), policy.clone())?,
            semantic_hub,
        })
    }

    /// A store builder with every portal slice, the `language` and `error`
    /// feature reducers, and action tracing.
    pub fn store_builder(&self, language: &str) -> StoreBuilder {
        StoreBuilder::default()
            .feature(LANGUAGE_KEY, LanguageState::new(language))
            .feature(ERROR_KEY, ErrorState::default())
            .api(self.marketplace.slice())
            .api(self.app_subscription.slice())
            .api(self.semantic_models.slice())
            .middleware(TracingMiddleware)
    }
}
