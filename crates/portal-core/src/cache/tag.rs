// ── Cache tags ──
//
// Queries declare the tags their data depends on; mutations declare the
// tags they make stale.

use std::fmt;

/// Label linking cached data to the mutations that invalidate it.
///
/// A tag without an id stands for a whole kind (`"SemanticModels"`); a tag
/// with an id names one instance (`"SubscriptionDetail:app/sub"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    kind: String,
    id: Option<String>,
}

impl Tag {
    /// A kind-wide tag.
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
        }
    }

    /// A tag naming one instance of `kind`.
    pub fn with_id(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.into()),
        }
    }

    pub fn kind_name(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether invalidating `self` makes data that provided `provided` stale.
    ///
    /// A kind-wide invalidation hits every tag of that kind. An id-specific
    /// invalidation hits only the same id.
    pub fn invalidates(&self, provided: &Tag) -> bool {
        if self.kind != provided.kind {
            return false;
        }
        match &self.id {
            None => true,
            Some(id) => provided.id.as_deref() == Some(id.as_str()),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{id}", self.kind),
            None => f.write_str(&self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tag_invalidates_every_instance() {
        let all = Tag::kind("SubscriptionDetail");
        assert!(all.invalidates(&Tag::with_id("SubscriptionDetail", "a/1")));
        assert!(all.invalidates(&Tag::kind("SubscriptionDetail")));
        assert!(!all.invalidates(&Tag::kind("SemanticModels")));
    }

    #[test]
    fn id_tag_matches_only_same_id() {
        let one = Tag::with_id("SubscriptionDetail", "a/1");
        assert!(one.invalidates(&Tag::with_id("SubscriptionDetail", "a/1")));
        assert!(!one.invalidates(&Tag::with_id("SubscriptionDetail", "a/2")));
        assert!(!one.invalidates(&Tag::kind("SubscriptionDetail")));
    }

    #[test]
    fn display() {
        assert_eq!(Tag::with_id("SemanticModel", "urn:x").to_string(), "SemanticModel:urn:x");
        assert_eq!(Tag::kind("SemanticModels").to_string(), "SemanticModels");
    }
}
