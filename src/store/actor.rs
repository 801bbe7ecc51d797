use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::domain::{Customer, Order, Product};

use super::client::StoreClient;
use super::document::{Document, Versioned};
use super::error::StoreError;
use super::messages::{DocRequest, StoreRequest};
use super::transaction::{DocRef, Precondition, Transaction, Write};

/// The store task. Owns every collection; processing one message at a time
/// makes `Commit` atomic by construction, while version preconditions
/// detect writes that landed between a caller's reads and its commit.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    products: HashMap<String, Versioned<Product>>,
    orders: HashMap<String, Versioned<Order>>,
    customers: HashMap<String, Versioned<Customer>>,
    idempotency_keys: HashMap<String, String>,
    counters: HashMap<&'static str, u64>,
}

impl StoreActor {
    pub fn new(buffer_size: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            products: HashMap::new(),
            orders: HashMap::new(),
            customers: HashMap::new(),
            idempotency_keys: HashMap::new(),
            counters: HashMap::new(),
        };
        (actor, StoreClient::new(sender))
    }

    #[instrument(name = "document_store", skip(self))]
    pub async fn run(mut self) {
        info!("Document store starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Product(req) => {
                    Self::handle_doc_request(&mut self.products, &mut self.counters, req);
                }
                StoreRequest::Order(req) => {
                    Self::handle_doc_request(&mut self.orders, &mut self.counters, req);
                }
                StoreRequest::Customer(req) => {
                    Self::handle_doc_request(&mut self.customers, &mut self.counters, req);
                }
                StoreRequest::FindCustomerByEmail { email, respond_to } => {
                    let found = self
                        .customers
                        .values()
                        .find(|v| v.doc.email.eq_ignore_ascii_case(&email))
                        .map(|v| (v.doc.clone(), v.version));
                    let _ = respond_to.send(Ok(found));
                }
                StoreRequest::LookupIdempotencyKey { key, respond_to } => {
                    let _ = respond_to.send(Ok(self.idempotency_keys.get(&key).cloned()));
                }
                StoreRequest::AllocateId { prefix, respond_to } => {
                    let _ = respond_to.send(Ok(allocate_id(&mut self.counters, prefix)));
                }
                StoreRequest::Commit {
                    transaction,
                    respond_to,
                } => {
                    let result = self.handle_commit(transaction);
                    let _ = respond_to.send(result);
                }
            }
        }

        info!("Document store stopped");
    }

    fn handle_doc_request<T: Document>(
        collection: &mut HashMap<String, Versioned<T>>,
        counters: &mut HashMap<&'static str, u64>,
        request: DocRequest<T>,
    ) {
        match request {
            DocRequest::Create {
                payload,
                respond_to,
            } => {
                let id = allocate_id(counters, T::ID_PREFIX);
                let result = T::from_create(id.clone(), payload, Utc::now())
                    .map(|doc| {
                        collection.insert(id.clone(), Versioned { version: 1, doc });
                        id
                    })
                    .map_err(StoreError::Invalid);
                let _ = respond_to.send(result);
            }
            DocRequest::Get { id, respond_to } => {
                let found = collection.get(&id).map(|v| (v.doc.clone(), v.version));
                let _ = respond_to.send(Ok(found));
            }
            DocRequest::List { filter, respond_to } => {
                let mut docs: Vec<T> = collection
                    .values()
                    .filter(|v| v.doc.matches(&filter))
                    .map(|v| v.doc.clone())
                    .collect();
                docs.sort_by(|a, b| a.id().cmp(b.id()));
                let _ = respond_to.send(Ok(docs));
            }
            DocRequest::Patch {
                id,
                patch,
                respond_to,
            } => {
                let result = match collection.get_mut(&id) {
                    Some(versioned) => {
                        // Patch a copy so a validation failure leaves the
                        // stored document untouched.
                        let mut doc = versioned.doc.clone();
                        match doc.apply_patch(patch, Utc::now()) {
                            Ok(()) => {
                                versioned.version += 1;
                                versioned.doc = doc.clone();
                                Ok(doc)
                            }
                            Err(e) => Err(StoreError::Invalid(e)),
                        }
                    }
                    None => Err(StoreError::NotFound {
                        collection: T::COLLECTION,
                        id,
                    }),
                };
                let _ = respond_to.send(result);
            }
            DocRequest::Delete { id, respond_to } => {
                let result = match collection.remove(&id) {
                    Some(_) => Ok(()),
                    None => Err(StoreError::NotFound {
                        collection: T::COLLECTION,
                        id,
                    }),
                };
                let _ = respond_to.send(result);
            }
        }
    }

    fn handle_commit(&mut self, transaction: Transaction) -> Result<(), StoreError> {
        for precondition in &transaction.preconditions {
            self.check_precondition(precondition)?;
        }

        debug!(
            writes = transaction.writes.len(),
            preconditions = transaction.preconditions.len(),
            "Applying commit"
        );

        for write in transaction.writes {
            match write {
                Write::PutProduct(doc) => put(&mut self.products, doc),
                Write::PutOrder(doc) => put(&mut self.orders, doc),
                Write::PutCustomer(doc) => put(&mut self.customers, doc),
                Write::RecordIdempotencyKey { key, order_id } => {
                    self.idempotency_keys.insert(key, order_id);
                }
            }
        }
        Ok(())
    }

    fn check_precondition(&self, precondition: &Precondition) -> Result<(), StoreError> {
        let current = match &precondition.doc {
            DocRef::Product(id) => self.products.get(id).map(|v| v.version),
            DocRef::Order(id) => self.orders.get(id).map(|v| v.version),
            DocRef::Customer(id) => self.customers.get(id).map(|v| v.version),
            DocRef::CustomerEmail(email) => self
                .customers
                .values()
                .find(|v| v.doc.email.eq_ignore_ascii_case(email))
                .map(|v| v.version),
            DocRef::IdempotencyKey(key) => {
                return match (self.idempotency_keys.get(key), precondition.expected) {
                    (None, None) => Ok(()),
                    (Some(order_id), None) => Err(StoreError::DuplicateRequest {
                        order_id: order_id.clone(),
                    }),
                    _ => Err(StoreError::Conflict(precondition.doc.to_string())),
                };
            }
        };
        if current == precondition.expected {
            Ok(())
        } else {
            debug!(doc = %precondition.doc, ?current, expected = ?precondition.expected, "Precondition failed");
            Err(StoreError::Conflict(precondition.doc.to_string()))
        }
    }
}

fn allocate_id(counters: &mut HashMap<&'static str, u64>, prefix: &'static str) -> String {
    let counter = counters.entry(prefix).or_insert(1);
    let id = format!("{prefix}{counter}");
    *counter += 1;
    id
}

fn put<T: Document>(collection: &mut HashMap<String, Versioned<T>>, doc: T) {
    match collection.entry(doc.id().to_string()) {
        Entry::Occupied(mut entry) => {
            let versioned = entry.get_mut();
            versioned.version += 1;
            versioned.doc = doc;
        }
        Entry::Vacant(entry) => {
            entry.insert(Versioned { version: 1, doc });
        }
    }
}
