//! In-process document store: versioned collections served by a single
//! actor task, with single-document CRUD and a multi-document atomic
//! commit guarded by version preconditions.

mod actor;
mod client;
mod collections;
mod document;
mod error;
mod messages;
mod transaction;

pub use actor::StoreActor;
pub use client::StoreClient;
pub use document::{Collection, Document, Version};
pub use error::StoreError;
pub use messages::{DocRequest, Response, StoreRequest};
pub use transaction::{DocRef, Precondition, Transaction, Write};
