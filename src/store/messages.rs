use tokio::sync::oneshot;

use crate::domain::{Customer, Order, Product};

use super::document::{Document, Version};
use super::error::StoreError;
use super::transaction::Transaction;

/// Oneshot response channel carried by every store request.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// Generic single-document operations, one instantiation per collection.
#[derive(Debug)]
pub enum DocRequest<T: Document> {
    Create {
        payload: T::CreatePayload,
        respond_to: Response<String>,
    },
    Get {
        id: String,
        respond_to: Response<Option<(T, Version)>>,
    },
    List {
        filter: T::Filter,
        respond_to: Response<Vec<T>>,
    },
    Patch {
        id: String,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Delete {
        id: String,
        respond_to: Response<()>,
    },
}

/// Everything the store actor serves.
#[derive(Debug)]
pub enum StoreRequest {
    Product(DocRequest<Product>),
    Order(DocRequest<Order>),
    Customer(DocRequest<Customer>),
    /// Email lookup over the customer collection, used by the quick-order
    /// path.
    FindCustomerByEmail {
        email: String,
        respond_to: Response<Option<(Customer, Version)>>,
    },
    /// Returns the order id a key was committed with, if any.
    LookupIdempotencyKey {
        key: String,
        respond_to: Response<Option<String>>,
    },
    /// Hands out a fresh identifier without writing anything. Gaps from
    /// aborted transactions are fine; ids are never reused.
    AllocateId {
        prefix: &'static str,
        respond_to: Response<String>,
    },
    /// Atomically checks every precondition against current state and, if
    /// all hold, applies every write.
    Commit {
        transaction: Transaction,
        respond_to: Response<()>,
    },
}
