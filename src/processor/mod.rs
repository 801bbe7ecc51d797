//! The order transaction processor: the one place orders come into
//! existence. Each attempt reads everything it depends on, buffers every
//! write, and commits against version preconditions; a conflicting
//! concurrent commit aborts the attempt and the whole read-then-write
//! sequence re-executes from scratch.

mod error;
mod request;

pub use error::OrderError;
pub use request::{CustomerRef, OrderItemRequest, OrderRequest};

use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::auth::Caller;
use crate::config::{Config, SpendPolicy};
use crate::domain::{Customer, LineItem, Order, OrderStatus, PaymentStatus, Product};
use crate::notify::Notifier;
use crate::store::{DocRef, StoreClient, StoreError, Transaction, Write};

/// Outcome of a single commit attempt.
enum Committed {
    New(Order),
    /// The idempotency key was already committed; no new writes happened.
    Replayed(String),
}

enum AttemptError {
    /// A precondition failed; re-read and retry.
    Conflict(String),
    Fatal(OrderError),
}

impl From<StoreError> for AttemptError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(doc) => AttemptError::Conflict(doc),
            other => AttemptError::Fatal(OrderError::StoreUnavailable(other.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct OrderProcessor {
    store: StoreClient,
    notifier: Notifier,
    spend_policy: SpendPolicy,
    max_attempts: u32,
}

impl OrderProcessor {
    pub fn new(store: StoreClient, notifier: Notifier, config: &Config) -> Self {
        Self {
            store,
            notifier,
            spend_policy: config.spend_policy,
            max_attempts: config.max_commit_attempts,
        }
    }

    /// Commits the proposed order atomically with its stock decrements and
    /// ledger update, or fails with no effect at all. Returns the new (or,
    /// for an idempotent replay, the original) order id.
    #[instrument(skip(self, caller, request), fields(caller = %caller.id, items = request.items.len()))]
    pub async fn create_order(
        &self,
        caller: &Caller,
        request: OrderRequest,
    ) -> Result<String, OrderError> {
        validate(&request)?;

        for attempt in 1..=self.max_attempts {
            match self.attempt(&request).await {
                Ok(Committed::New(order)) => {
                    info!(order_id = %order.id, total = %order.total, "Order committed");
                    self.notifier.order_confirmed(&order);
                    return Ok(order.id);
                }
                Ok(Committed::Replayed(order_id)) => {
                    info!(%order_id, "Duplicate submission, returning original order");
                    return Ok(order_id);
                }
                Err(AttemptError::Conflict(doc)) => {
                    debug!(attempt, %doc, "Commit conflict, re-reading");
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
            }
        }
        Err(OrderError::ConflictRetryExhausted {
            attempts: self.max_attempts,
        })
    }

    /// One read-then-write pass. All reads complete before any write is
    /// issued; the writes travel to the store as a single commit.
    async fn attempt(&self, request: &OrderRequest) -> Result<Committed, AttemptError> {
        let mut tx = Transaction::new();
        let now = Utc::now();

        if let Some(key) = &request.idempotency_key {
            if let Some(order_id) = self.store.lookup_idempotency_key(key).await? {
                return Ok(Committed::Replayed(order_id));
            }
            tx.require_absent(DocRef::IdempotencyKey(key.clone()));
        }

        let mut items = Vec::with_capacity(request.items.len());
        let mut subtotal = Decimal::ZERO;
        for line in &request.items {
            let Some((product, version)) = self.store.get::<Product>(&line.product_id).await?
            else {
                return Err(AttemptError::Fatal(OrderError::ProductNotFound(
                    line.product_id.clone(),
                )));
            };
            if product.stock < line.quantity {
                return Err(AttemptError::Fatal(OrderError::OutOfStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: line.quantity,
                }));
            }

            let line_total = product.price * Decimal::from(line.quantity);
            subtotal += line_total;
            items.push(LineItem {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit_price: product.price,
                total: line_total,
            });

            tx.require(DocRef::Product(product.id.clone()), version);
            let mut updated = product;
            updated.set_stock(updated.stock - line.quantity);
            updated.updated_at = now;
            tx.write(Write::PutProduct(updated));
        }

        let total = subtotal + request.shipping_cost;
        if total != request.total {
            return Err(AttemptError::Fatal(OrderError::Validation(format!(
                "order total mismatch: computed {total}, request claims {}",
                request.total
            ))));
        }

        let mut customer = match &request.customer {
            CustomerRef::Existing(id) => {
                let Some((customer, version)) = self.store.get::<Customer>(id).await? else {
                    return Err(AttemptError::Fatal(OrderError::CustomerNotFound(id.clone())));
                };
                tx.require(DocRef::Customer(customer.id.clone()), version);
                customer
            }
            CustomerRef::Email {
                email,
                first_name,
                last_name,
            } => match self.store.find_customer_by_email(email).await? {
                Some((customer, version)) => {
                    tx.require(DocRef::Customer(customer.id.clone()), version);
                    customer
                }
                None => {
                    // Quick order for an unknown email: the ledger record is
                    // born in the same commit as the order. The absence
                    // precondition makes a concurrent registration conflict
                    // instead of silently duplicating the email.
                    tx.require_absent(DocRef::CustomerEmail(email.clone()));
                    Customer {
                        id: self.store.allocate_id::<Customer>().await?,
                        email: email.clone(),
                        first_name: first_name.clone(),
                        last_name: last_name.clone(),
                        orders: Vec::new(),
                        total_spent: Decimal::ZERO,
                        created_at: now,
                        updated_at: now,
                    }
                }
            },
        };

        let order_id = self.store.allocate_id::<Order>().await?;
        let spend = match self.spend_policy {
            SpendPolicy::OnCreation => total,
            SpendPolicy::OnPayment => Decimal::ZERO,
        };
        customer.record_order(order_id.clone(), spend, now);

        let order = Order {
            id: order_id.clone(),
            customer_id: customer.id.clone(),
            customer_email: customer.email.clone(),
            items,
            subtotal,
            shipping_cost: request.shipping_cost,
            total,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_address: request.shipping_address.clone(),
            billing_address: request.billing_address.clone(),
            idempotency_key: request.idempotency_key.clone(),
            created_at: now,
            updated_at: now,
        };

        tx.write(Write::PutCustomer(customer));
        tx.write(Write::PutOrder(order.clone()));
        if let Some(key) = &request.idempotency_key {
            tx.write(Write::RecordIdempotencyKey {
                key: key.clone(),
                order_id: order_id.clone(),
            });
        }

        match self.store.commit(tx).await {
            Ok(()) => Ok(Committed::New(order)),
            Err(StoreError::Conflict(doc)) => Err(AttemptError::Conflict(doc)),
            // Another writer committed our key between lookup and commit.
            Err(StoreError::DuplicateRequest { order_id }) => Ok(Committed::Replayed(order_id)),
            Err(e) => Err(AttemptError::Fatal(OrderError::StoreUnavailable(
                e.to_string(),
            ))),
        }
    }
}

/// Structural checks that need no store access. Failures here reject the
/// request before anything is read.
fn validate(request: &OrderRequest) -> Result<(), OrderError> {
    if request.items.is_empty() {
        return Err(OrderError::Validation("order has no line items".to_string()));
    }
    let mut seen = HashSet::new();
    for item in &request.items {
        if item.quantity == 0 {
            return Err(OrderError::Validation(format!(
                "quantity for {} must be at least 1",
                item.product_id
            )));
        }
        if !seen.insert(item.product_id.as_str()) {
            return Err(OrderError::Validation(format!(
                "duplicate line item for {}",
                item.product_id
            )));
        }
    }
    if request.shipping_cost < Decimal::ZERO {
        return Err(OrderError::Validation(
            "shipping cost cannot be negative".to_string(),
        ));
    }
    if let Some(key) = &request.idempotency_key {
        if key.trim().is_empty() {
            return Err(OrderError::Validation(
                "idempotency key cannot be empty".to_string(),
            ));
        }
    }
    if let CustomerRef::Email { email, .. } = &request.customer {
        if !email.contains('@') {
            return Err(OrderError::Validation(format!(
                "invalid customer email: {email}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, ProductCreate};
    use crate::mock_framework::{
        create_mock_store, expect_allocate_id, expect_commit, expect_customer_get,
        expect_product_get,
    };
    use crate::store::StoreActor;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    fn address() -> Address {
        Address {
            line1: "14 Still Lane".to_string(),
            line2: None,
            city: "Bristol".to_string(),
            postcode: "BS1 4QA".to_string(),
            country: "GB".to_string(),
        }
    }

    fn request(product_id: &str, quantity: u32, total: Decimal) -> OrderRequest {
        OrderRequest {
            customer: CustomerRef::Existing("customer_1".to_string()),
            items: vec![OrderItemRequest {
                product_id: product_id.to_string(),
                quantity,
            }],
            shipping_cost: Decimal::ZERO,
            total,
            shipping_address: address(),
            billing_address: address(),
            idempotency_key: None,
        }
    }

    fn product(id: &str, price: Decimal, stock: u32) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: "London Dry".to_string(),
            sku: "GIN-LD-70".to_string(),
            description: String::new(),
            price,
            stock,
            status: crate::domain::ProductStatus::Active,
            category: "london-dry".to_string(),
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn customer(id: &str) -> Customer {
        let now = Utc::now();
        Customer {
            id: id.to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Archer".to_string(),
            orders: Vec::new(),
            total_spent: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    fn processor_with(store: StoreClient, notifier: Notifier) -> OrderProcessor {
        OrderProcessor::new(store, notifier, &Config::default())
    }

    #[tokio::test]
    async fn conflict_retries_with_fresh_reads() {
        let (store, mut rx) = create_mock_store(16);
        let (notify_tx, _notify_rx) = mpsc::channel(4);
        let processor = processor_with(store, Notifier::new(notify_tx));

        let task = tokio::spawn({
            let processor = processor.clone();
            async move {
                processor
                    .create_order(&Caller::standard("staff_1"), request("product_1", 2, dec!(56)))
                    .await
            }
        });

        // First pass: reads at version 1, commit loses the race.
        let (id, responder) = expect_product_get(&mut rx).await.expect("product get");
        assert_eq!(id, "product_1");
        responder
            .send(Ok(Some((product("product_1", dec!(28), 10), 1))))
            .unwrap();

        let (id, responder) = expect_customer_get(&mut rx).await.expect("customer get");
        assert_eq!(id, "customer_1");
        responder.send(Ok(Some((customer("customer_1"), 1)))).unwrap();

        let (_, responder) = expect_allocate_id(&mut rx).await.expect("order id");
        responder.send(Ok("order_1".to_string())).unwrap();

        let (tx, responder) = expect_commit(&mut rx).await.expect("commit");
        assert_eq!(tx.preconditions.len(), 2);
        responder
            .send(Err(StoreError::Conflict("products/product_1".to_string())))
            .unwrap();

        // Second pass re-reads everything and succeeds.
        let (_, responder) = expect_product_get(&mut rx).await.expect("product re-get");
        responder
            .send(Ok(Some((product("product_1", dec!(28), 9), 2))))
            .unwrap();

        let (_, responder) = expect_customer_get(&mut rx).await.expect("customer re-get");
        responder.send(Ok(Some((customer("customer_1"), 1)))).unwrap();

        let (_, responder) = expect_allocate_id(&mut rx).await.expect("order id again");
        responder.send(Ok("order_2".to_string())).unwrap();

        let (tx, responder) = expect_commit(&mut rx).await.expect("second commit");
        // Fresh version stamp from the re-read.
        assert!(tx
            .preconditions
            .iter()
            .any(|p| p.doc == DocRef::Product("product_1".to_string()) && p.expected == Some(2)));
        responder.send(Ok(())).unwrap();

        assert_eq!(task.await.unwrap(), Ok("order_2".to_string()));
    }

    #[tokio::test]
    async fn notification_fires_once_per_commit_and_never_on_failure() {
        let (actor, store) = StoreActor::new(16);
        tokio::spawn(actor.run());
        let (notify_tx, mut notify_rx) = mpsc::channel(4);
        let processor = processor_with(store.clone(), Notifier::new(notify_tx));

        let product_id = store
            .create::<Product>(ProductCreate {
                name: "London Dry".to_string(),
                sku: "GIN-LD-70".to_string(),
                description: String::new(),
                price: dec!(28),
                stock: 3,
                category: "london-dry".to_string(),
                featured: false,
            })
            .await
            .unwrap();

        let staff = Caller::standard("staff_1");
        let quick = OrderRequest {
            customer: CustomerRef::Email {
                email: "bob@example.com".to_string(),
                first_name: "Bob".to_string(),
                last_name: "Breaker".to_string(),
            },
            ..request(&product_id, 2, dec!(56))
        };
        let order_id = processor.create_order(&staff, quick).await.unwrap();

        let notification = notify_rx.try_recv().expect("one notification");
        assert_eq!(notification.order_id, order_id);
        assert!(notify_rx.try_recv().is_err());

        // Remaining stock is 1; this fails and must not notify.
        let err = processor
            .create_order(&staff, request(&product_id, 2, dec!(56)))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::OutOfStock { available: 1, .. }));
        assert!(notify_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_requests_rejected_before_any_read() {
        let (store, mut rx) = create_mock_store(4);
        let (notify_tx, _notify_rx) = mpsc::channel(4);
        let processor = processor_with(store, Notifier::new(notify_tx));
        let staff = Caller::standard("staff_1");

        let empty = OrderRequest {
            items: Vec::new(),
            ..request("product_1", 1, Decimal::ZERO)
        };
        assert!(matches!(
            processor.create_order(&staff, empty).await,
            Err(OrderError::Validation(_))
        ));

        let zero_quantity = request("product_1", 0, dec!(0));
        assert!(matches!(
            processor.create_order(&staff, zero_quantity).await,
            Err(OrderError::Validation(_))
        ));

        // No store traffic happened.
        assert!(rx.try_recv().is_err());
    }
}
