// App subscription records, as served to app providers.

use serde::{Deserialize, Serialize};
use url::Url;

use super::apps::SubscriptionStatus;
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalUserData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Provider-side view of one customer subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetail {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub bpn: Option<String>,
    #[serde(default)]
    pub contact: Vec<String>,
    #[serde(default)]
    pub offer_subscription_status: Option<SubscriptionStatus>,
    #[serde(default)]
    pub tenant_url: Option<String>,
    #[serde(default)]
    pub app_instance_id: Option<String>,
    #[serde(default)]
    pub technical_user_data: Vec<TechnicalUserData>,
}

/// Request body for the tenant URL update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantUrlUpdate {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySubscriptionStatus {
    pub company_id: String,
    pub company_name: String,
    pub subscription_id: String,
    pub offer_subscription_status: SubscriptionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionContent {
    pub offer_id: String,
    #[serde(default)]
    pub offer_name: Option<String>,
    #[serde(default)]
    pub company_subscription_statuses: Vec<CompanySubscriptionStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_elements: u64,
    pub total_pages: u32,
    pub page: u32,
    pub content_size: u32,
}

/// One page of provider subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidedSubscriptions {
    pub meta: PageMeta,
    pub content: Vec<SubscriptionContent>,
}

/// Check that a tenant URL is an absolute http(s) URL with a host.
///
/// Runs before any update request is sent.
pub fn validate_tenant_url(raw: &str) -> Result<Url, Error> {
    let invalid = |reason: &str| Error::Validation {
        field: "tenantUrl".into(),
        reason: format!("{reason}: {raw:?}"),
    };

    let url = Url::parse(raw.trim()).map_err(|_| invalid("not a URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_url() {
        assert!(validate_tenant_url("https://example.com").is_ok());
        assert!(validate_tenant_url("http://tenant.example.com:8080/path").is_ok());
    }

    #[test]
    fn rejects_non_urls() {
        for raw in ["not-a-url", "", "ftp://example.com", "mailto:ops@example.com"] {
            assert!(
                matches!(validate_tenant_url(raw), Err(Error::Validation { .. })),
                "expected {raw:?} to be rejected"
            );
        }
    }
}
