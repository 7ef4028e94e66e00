// Semantic model hub slice.
//
// Rooted at the hub API path of the semantic service. Model ids are URNs
// and are percent-encoded into the path.

use bytes::Bytes;
use portal_api::models::{ArtifactType, FilterParams, ModelList, NewSemanticModel, SemanticModel};
use portal_api::semantic::encode_id;
use portal_api::{HttpClient, Request, ResponseType};
use serde::Serialize;

use crate::cache::Tag;
use crate::config::CachePolicy;
use crate::endpoint::{MutationDef, MutationEndpoint, QueryDef, QueryEndpoint};
use crate::error::StoreError;
use crate::slice::ApiSlice;

pub const REDUCER_PATH: &str = "rtk/semanticModels";

pub const MODELS_TAG: &str = "SemanticModels";
pub const MODEL_TAG: &str = "SemanticModel";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactArgs {
    pub id: String,
    pub artifact: ArtifactType,
}

#[derive(Clone, Debug)]
pub struct SemanticModelsApi {
    slice: ApiSlice,
    pub fetch_models: QueryEndpoint<FilterParams, ModelList>,
    pub fetch_model_by_id: QueryEndpoint<String, SemanticModel>,
    pub fetch_artifact: QueryEndpoint<ArtifactArgs, Bytes>,
    pub post_semantic_model: MutationEndpoint<NewSemanticModel, SemanticModel>,
}

impl SemanticModelsApi {
    /// `client` must already be rooted at the hub API
    /// (see `SemanticHubClient::for_service`).
    pub fn new(client: HttpClient, policy: CachePolicy) -> Result<Self, StoreError> {
        let mut b = ApiSlice::builder(REDUCER_PATH, client)?;
        b.policy(policy);

        let fetch_models = b.query(
            "fetchModels",
            QueryDef::json(|filters: &FilterParams| Request::get("models").query_from(filters))
                .provides_tags(|_, _| vec![Tag::kind(MODELS_TAG)]),
        )?;

        let fetch_model_by_id = b.query(
            "fetchModelById",
            QueryDef::json(|id: &String| Ok(Request::get(format!("models/{}", encode_id(id)))))
                .provides_tags(|id, _| vec![Tag::with_id(MODEL_TAG, id.clone())]),
        )?;

        let fetch_artifact = b.query(
            "fetchArtifact",
            QueryDef::raw(
                |args: &ArtifactArgs| {
                    Ok(Request::get(format!(
                        "models/{}/{}",
                        encode_id(&args.id),
                        args.artifact.path_suffix()
                    ))
                    .response_type(ResponseType::Binary))
                },
                |resp| Ok(resp.into_bytes()),
            )
            .provides_tags(|args, _| vec![Tag::with_id(MODEL_TAG, args.id.clone())]),
        )?;

        let post_semantic_model = b.mutation(
            "postSemanticModel",
            MutationDef::json(|model: &NewSemanticModel| {
                Ok(Request::post("models")
                    .query("type", &model.model_type)
                    .query("status", &model.status)
                    .text(model.model.clone()))
            })
            .invalidates_tags(|_, result| match result {
                Ok(_) => vec![Tag::kind(MODELS_TAG)],
                Err(_) => Vec::new(),
            }),
        )?;

        Ok(Self {
            slice: b.build(),
            fetch_models,
            fetch_model_by_id,
            fetch_artifact,
            post_semantic_model,
        })
    }

    pub fn slice(&self) -> &ApiSlice {
        &self.slice
    }
}
