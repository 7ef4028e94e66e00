// ── Query cache primitives ──
//
// Keys, tags, and per-entry state shared by slices and the store.

mod entry;
mod key;
mod tag;

pub(crate) use entry::{CacheEntry, FetchMode};
pub use entry::{MutationSnapshot, Payload, QuerySnapshot, QueryStatus};
pub use key::CacheKey;
pub use tag::Tag;
