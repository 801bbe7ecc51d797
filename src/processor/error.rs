use thiserror::Error;

/// Errors from the order transaction. Every variant means no store effect
/// happened: validation and read failures abort before the commit, and a
/// failed commit applies nothing.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("invalid order request: {0}")]
    Validation(String),
    #[error("product not found: {0}")]
    ProductNotFound(String),
    #[error("customer not found: {0}")]
    CustomerNotFound(String),
    #[error("insufficient stock for {product}: {available} available, {requested} requested")]
    OutOfStock {
        product: String,
        available: u32,
        requested: u32,
    },
    /// Sustained contention; the request may be retried as a whole. Callers
    /// without an idempotency key risk double submission.
    #[error("order could not be committed after {attempts} attempts")]
    ConflictRetryExhausted { attempts: u32 },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}
