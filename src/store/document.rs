use std::fmt::Debug;

use chrono::{DateTime, Utc};

use super::messages::{DocRequest, StoreRequest};

/// Monotonic per-document version, bumped on every write. Commit
/// preconditions compare against it to detect conflicting writers.
pub type Version = u64;

/// Trait a domain type must implement to live in a store collection.
pub trait Document: Clone + Send + Sync + Debug + 'static {
    type CreatePayload: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    type Filter: Send + Sync + Debug;

    /// Collection name, used in error and log messages.
    const COLLECTION: &'static str;
    /// Prefix for store-allocated identifiers, e.g. `product_`.
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;

    /// Builds the full document from a freshly allocated id and the create
    /// payload. Validation failures abort the insert.
    fn from_create(id: String, payload: Self::CreatePayload, now: DateTime<Utc>)
        -> Result<Self, String>;

    /// Applies a partial update in place. Validation failures leave the
    /// stored document untouched.
    fn apply_patch(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> Result<(), String>;

    fn matches(&self, filter: &Self::Filter) -> bool;
}

/// Routes a typed [`DocRequest`] into the store's message enum. One impl
/// per collection.
pub trait Collection: Document {
    fn into_request(request: DocRequest<Self>) -> StoreRequest;
}

/// A stored document together with its current version.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub version: Version,
    pub doc: T,
}
