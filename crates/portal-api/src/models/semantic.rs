// Semantic model hub records.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticModel {
    pub urn: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub model_type: String,
    pub status: String,
}

/// One page of semantic models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelList {
    pub items: Vec<SemanticModel>,
    pub total_items: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub item_count: u32,
}

/// List filters, flattened into the query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_type: Option<String>,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 10,
            namespace_filter: None,
            status: Vec::new(),
            name_filter: None,
            name_type: None,
        }
    }
}

/// A model upload: the turtle document plus its declared type and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSemanticModel {
    pub model: String,
    #[serde(rename = "type")]
    pub model_type: String,
    pub status: String,
}

/// Downloadable model artifacts. All are served as opaque bytes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ArtifactType {
    Diagram,
    Ttl,
    Json,
    Payload,
    Docu,
}

impl ArtifactType {
    /// Path segment appended after the model id.
    pub fn path_suffix(self) -> &'static str {
        match self {
            Self::Diagram => "diagram",
            Self::Ttl => "file",
            Self::Json => "json-schema",
            Self::Payload => "example-payload",
            Self::Docu => "documentation",
        }
    }
}
