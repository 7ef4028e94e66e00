// Wire models for the portal backends.
//
// Plain value records mirrored from server JSON. The client never treats
// them as authoritative; freshness is tracked by the cache layer.

pub mod apps;
pub mod semantic;
pub mod subscription;

pub use apps::{AppDetails, AppMarketplaceApp, ImageType, SubscriptionStatus, SubscriptionStatusItem};
pub use semantic::{ArtifactType, FilterParams, ModelList, NewSemanticModel, SemanticModel};
pub use subscription::{
    CompanySubscriptionStatus, PageMeta, ProvidedSubscriptions, SubscriptionContent,
    SubscriptionDetail, TechnicalUserData, TenantUrlUpdate, validate_tenant_url,
};
