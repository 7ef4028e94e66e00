// Marketplace app records, mirrored from the marketplace backend JSON.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageType {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Lifecycle state of an offer subscription.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    Active,
    Pending,
    Inactive,
    InReview,
    Created,
}

impl SubscriptionStatus {
    /// Human-readable label shown next to an app.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Pending => "Pending",
            Self::Inactive => "Inactive",
            Self::InReview => "In Review",
            Self::Created => "In Progress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMarketplaceApp {
    pub id: String,
    pub title: String,
    pub provider: String,
    #[serde(default)]
    pub lead_picture_uri: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusItem {
    pub app_id: String,
    pub offer_subscription_status: SubscriptionStatus,
}

/// Full app record as shown on the app detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDetails {
    #[serde(flatten)]
    pub app: AppMarketplaceApp,
    #[serde(default)]
    pub provider_uri: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub detail_picture_uris: Vec<String>,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub is_subscribed: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn status_round_trips_wire_names() {
        let item: SubscriptionStatusItem = serde_json::from_value(json!({
            "appId": "a1",
            "offerSubscriptionStatus": "IN_REVIEW"
        }))
        .unwrap();
        assert_eq!(item.offer_subscription_status, SubscriptionStatus::InReview);
        assert_eq!(item.offer_subscription_status.label(), "In Review");
        assert_eq!(item.offer_subscription_status.to_string(), "IN_REVIEW");
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "active".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn app_details_flatten_base_fields() {
        let details: AppDetails = serde_json::from_value(json!({
            "id": "5cf74ef8",
            "title": "Digital Twin Registry",
            "provider": "Catena-X",
            "leadPictureUri": "lead.png",
            "shortDescription": "Registry",
            "useCases": ["Traceability"],
            "price": "free",
            "providerUri": "https://provider.example.com",
            "contactEmail": "ops@example.com",
            "contactNumber": "",
            "detailPictureUris": [],
            "longDescription": "Long",
            "isSubscribed": "ACTIVE",
            "tags": ["twin"],
            "languages": ["de", "en"]
        }))
        .unwrap();

        assert_eq!(details.app.title, "Digital Twin Registry");
        assert_eq!(details.languages, vec!["de", "en"]);
        assert!(details.app.status.is_none());
    }
}
