use crate::domain::{Customer, Order, Product};

use super::document::Version;

/// Names a single document (or idempotency key) for a precondition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocRef {
    Product(String),
    Order(String),
    Customer(String),
    /// Uniqueness guard for quick-order customer creation: holds only
    /// while no customer carries this email.
    CustomerEmail(String),
    IdempotencyKey(String),
}

impl std::fmt::Display for DocRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocRef::Product(id) => write!(f, "products/{id}"),
            DocRef::Order(id) => write!(f, "orders/{id}"),
            DocRef::Customer(id) => write!(f, "customers/{id}"),
            DocRef::CustomerEmail(email) => write!(f, "customers?email={email}"),
            DocRef::IdempotencyKey(key) => write!(f, "idempotency/{key}"),
        }
    }
}

/// `expected: Some(v)` means the document must still be at version `v`;
/// `None` means it must not exist.
#[derive(Debug, Clone)]
pub struct Precondition {
    pub doc: DocRef,
    pub expected: Option<Version>,
}

/// One buffered write, applied only after every precondition has passed.
#[derive(Debug, Clone)]
pub enum Write {
    PutProduct(Product),
    PutOrder(Order),
    PutCustomer(Customer),
    RecordIdempotencyKey { key: String, order_id: String },
}

/// A read-then-write unit: version preconditions gathered during the read
/// phase plus the writes to apply. All-or-nothing at commit.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub preconditions: Vec<Precondition>,
    pub writes: Vec<Write>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `doc` to still be at `version` at commit time.
    pub fn require(&mut self, doc: DocRef, version: Version) {
        self.preconditions.push(Precondition {
            doc,
            expected: Some(version),
        });
    }

    /// Requires `doc` to be absent at commit time.
    pub fn require_absent(&mut self, doc: DocRef) {
        self.preconditions.push(Precondition {
            doc,
            expected: None,
        });
    }

    pub fn write(&mut self, write: Write) {
        self.writes.push(write);
    }
}
