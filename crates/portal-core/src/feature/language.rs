// UI language selection.

use std::any::Any;

use serde_json::Value;

use super::FeatureReducer;
use crate::store::{Action, FeatureAction};

/// Registered under this key by `PortalApis::store_builder`.
pub const LANGUAGE_KEY: &str = "language";

const SET_LANGUAGE: &str = "language/set";

/// Current UI language, sent as `lang` on localized queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageState {
    language: String,
}

impl Default for LanguageState {
    fn default() -> Self {
        Self {
            language: "en".into(),
        }
    }
}

impl LanguageState {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Action switching the UI language.
    pub fn set(language: &str) -> Action {
        Action::Feature(FeatureAction::new(SET_LANGUAGE, Value::from(language)))
    }
}

impl FeatureReducer for LanguageState {
    fn reduce(&mut self, action: &Action) {
        if let Action::Feature(FeatureAction { kind, payload }) = action {
            if kind == SET_LANGUAGE {
                if let Some(lang) = payload.as_str().filter(|l| !l.is_empty()) {
                    self.language = lang.to_owned();
                }
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
