// Semantic hub client
//
// Hand-written client for the semantic model hub. Unlike the slice-based
// backends, callers use these methods directly; nothing here is cached.

use bytes::Bytes;
use tracing::debug;

use crate::client::HttpClient;
use crate::error::Error;
use crate::models::{ArtifactType, FilterParams, ModelList, NewSemanticModel, SemanticModel};
use crate::request::{Request, ResponseType};

/// Path of the hub API below the configured semantic base URL.
pub const HUB_API_PATH: &str = "hub/api/v1/";

/// Direct client for the semantic model hub.
#[derive(Debug, Clone)]
pub struct SemanticHubClient {
    http: HttpClient,
}

impl SemanticHubClient {
    /// Wrap a client whose base URL already points at the hub API root.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Build the hub client from the semantic service base URL.
    pub fn for_service(service: &HttpClient) -> Result<Self, Error> {
        Ok(Self {
            http: service.scoped(HUB_API_PATH)?,
        })
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// `GET models?{filters}`
    pub async fn get_models(&self, filters: &FilterParams) -> Result<ModelList, Error> {
        let req = Request::get("models").query_from(filters)?;
        self.http.request(req).await?.into_json()
    }

    /// Bundled model list shipped with the portal, no auth required.
    pub async fn get_static_models(&self) -> Result<ModelList, Error> {
        self.http.get_json("api/semanticModels/models.json").await
    }

    /// `GET models/{id}`
    pub async fn get_model_by_id(&self, id: &str) -> Result<SemanticModel, Error> {
        self.http.get_json(&format!("models/{}", encode_id(id))).await
    }

    /// Upload a turtle document. Type and status travel in the query string.
    pub async fn post_semantic_model(
        &self,
        model: &NewSemanticModel,
    ) -> Result<SemanticModel, Error> {
        debug!(model_type = %model.model_type, status = %model.status, "uploading semantic model");
        let req = Request::post("models")
            .query("type", &model.model_type)
            .query("status", &model.status)
            .text(model.model.clone());
        self.http.request(req).await?.into_json()
    }

    /// Download a model artifact as raw bytes.
    pub async fn get_artifact(&self, artifact: ArtifactType, id: &str) -> Result<Bytes, Error> {
        let req = Request::get(format!("models/{}/{}", encode_id(id), artifact.path_suffix()))
            .response_type(ResponseType::Binary);
        Ok(self.http.request(req).await?.into_bytes())
    }
}

/// Model ids are URNs and may carry `#`, which must not end the path.
pub fn encode_id(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes()).collect()
}
