use thiserror::Error;

/// Errors surfaced by the document store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{collection} not found: {id}")]
    NotFound {
        collection: &'static str,
        id: String,
    },
    /// A commit precondition no longer holds; the caller's transaction
    /// wrapper re-reads and retries.
    #[error("write conflict on {0}")]
    Conflict(String),
    /// An idempotency key presented as new was already committed.
    #[error("request already committed as {order_id}")]
    DuplicateRequest { order_id: String },
    #[error("invalid document: {0}")]
    Invalid(String),
    /// The store task is gone; nothing can be read or written.
    #[error("store unavailable: {0}")]
    Closed(String),
}
