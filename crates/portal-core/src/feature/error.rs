// Last error surfaced to the user.
//
// Failed queries and mutations of every slice land here so a single
// place in the UI can show them. Stale results discarded by a slice are
// still recorded: the request did fail.

use std::any::Any;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::FeatureReducer;
use crate::error::QueryError;
use crate::store::{Action, ApiEvent, FeatureAction};

/// Registered under this key by `PortalApis::store_builder`.
pub const ERROR_KEY: &str = "error";

const CLEAR_ERROR: &str = "error/clear";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfacedError {
    /// `"<reducer path>/<endpoint>"` or the reducer path for mutations.
    pub source: String,
    pub error: QueryError,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    last: Option<SurfacedError>,
    total: u64,
}

impl ErrorState {
    pub fn last(&self) -> Option<&SurfacedError> {
        self.last.as_ref()
    }

    /// Failures seen since the store was built.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn clear() -> Action {
        Action::Feature(FeatureAction::new(CLEAR_ERROR, Value::Null))
    }

    fn record(&mut self, source: String, error: &QueryError) {
        self.total += 1;
        self.last = Some(SurfacedError {
            source,
            error: error.clone(),
            at: Utc::now(),
        });
    }
}

impl FeatureReducer for ErrorState {
    fn reduce(&mut self, action: &Action) {
        match action {
            Action::Api(api) => match &api.event {
                ApiEvent::QueryRejected { key, error, .. } => {
                    self.record(format!("{}/{}", api.path, key.endpoint()), error);
                }
                ApiEvent::MutationRejected { error, .. } => {
                    self.record(api.path.to_string(), error);
                }
                _ => {}
            },
            Action::Feature(f) if f.kind == CLEAR_ERROR => self.last = None,
            _ => {}
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::CacheKey;
    use crate::store::ApiAction;

    #[test]
    fn records_and_clears() {
        let mut state = ErrorState::default();
        state.reduce(&Action::Api(ApiAction {
            path: Arc::from("rtk/apps/marketplace"),
            event: ApiEvent::QueryRejected {
                key: CacheKey::new("fetchActiveApps", &()).unwrap(),
                seq: 1,
                error: QueryError::HttpStatus {
                    status: 503,
                    message: "unavailable".into(),
                },
                tags: Vec::new(),
            },
        }));

        let last = state.last().unwrap();
        assert_eq!(last.source, "rtk/apps/marketplace/fetchActiveApps");
        assert_eq!(last.error.status(), Some(503));

        state.reduce(&ErrorState::clear());
        assert!(state.last().is_none());
        assert_eq!(state.total(), 1);
    }
}
