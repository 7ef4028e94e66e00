// ── Feature reducers ──
//
// Application state that is not server data (UI language, last surfaced
// error) lives in feature reducers. They share the store's lock and see
// every dispatched action, in registration order.

mod error;
mod language;

use std::any::Any;

pub use error::{ERROR_KEY, ErrorState, SurfacedError};
pub use language::{LANGUAGE_KEY, LanguageState};

use crate::store::Action;

/// A piece of application state updated synchronously by actions.
pub trait FeatureReducer: Send + 'static {
    /// Apply `action`. Actions meant for other reducers are ignored.
    fn reduce(&mut self, action: &Action);

    /// Downcast hook for `Store::with_feature`.
    fn as_any(&self) -> &dyn Any;
}
