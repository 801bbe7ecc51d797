use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::auth::{AccessError, Caller};
use crate::config::SpendPolicy;
use crate::domain::{Customer, Order, OrderFilter, OrderPatch, PaymentStatus};
use crate::impl_doc_client;
use crate::store::{DocRef, StoreClient, StoreError, Transaction, Write};

/// Errors from order-desk operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderDeskError {
    #[error("order not found: {0}")]
    NotFound(String),
    #[error("invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("admin role required")]
    AdminRequired,
    #[error("order update could not be committed after {attempts} attempts")]
    ConflictRetryExhausted { attempts: u32 },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for OrderDeskError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id, .. } => OrderDeskError::NotFound(id),
            StoreError::Invalid(msg) => OrderDeskError::InvalidTransition(msg),
            StoreError::Closed(msg) => OrderDeskError::StoreUnavailable(msg),
            other => OrderDeskError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<AccessError> for OrderDeskError {
    fn from(_: AccessError) -> Self {
        OrderDeskError::AdminRequired
    }
}

/// Client for staff order management. Creation goes through the order
/// processor; this client covers the rest of an order's life.
#[derive(Clone)]
pub struct OrderDeskClient {
    store: StoreClient,
    spend_policy: SpendPolicy,
    max_commit_attempts: u32,
}

impl OrderDeskClient {
    pub fn new(store: StoreClient, spend_policy: SpendPolicy, max_commit_attempts: u32) -> Self {
        Self {
            store,
            spend_policy,
            max_commit_attempts,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, OrderDeskError> {
        debug!("Sending request");
        Ok(self.store.list::<Order>(filter).await?)
    }

    /// Staff status/payment update. When the spend policy defers ledger
    /// spend to payment time, marking an order paid commits the order and
    /// the customer ledger atomically, with conflict retry.
    #[instrument(skip(self, caller, patch), fields(caller = %caller.id))]
    pub async fn update_order(
        &self,
        caller: &Caller,
        id: &str,
        patch: OrderPatch,
    ) -> Result<Order, OrderDeskError> {
        debug!("Sending request");
        for _ in 0..self.max_commit_attempts {
            let Some((order, order_version)) = self.store.get::<Order>(id).await? else {
                return Err(OrderDeskError::NotFound(id.to_string()));
            };

            let now = Utc::now();
            let mut updated = order.clone();
            updated
                .apply_patch(&patch, now)
                .map_err(OrderDeskError::InvalidTransition)?;

            let newly_paid = updated.payment_status == PaymentStatus::Paid
                && order.payment_status != PaymentStatus::Paid;
            if !(newly_paid && self.spend_policy == SpendPolicy::OnPayment) {
                // Single-document change; the store revalidates the patch
                // against the current document. Last write wins.
                return Ok(self.store.patch::<Order>(id, patch.clone()).await?);
            }

            let mut tx = Transaction::new();
            tx.require(DocRef::Order(id.to_string()), order_version);
            tx.write(Write::PutOrder(updated.clone()));

            match self.store.get::<Customer>(&order.customer_id).await? {
                Some((mut customer, customer_version)) => {
                    customer.add_spend(order.total, now);
                    tx.require(DocRef::Customer(order.customer_id.clone()), customer_version);
                    tx.write(Write::PutCustomer(customer));
                }
                None => {
                    // Ledger record was hard-deleted; the payment still
                    // stands, there is just no spend counter to feed.
                    warn!(customer_id = %order.customer_id, "Customer ledger missing, skipping spend update");
                }
            }

            match self.store.commit(tx).await {
                Ok(()) => {
                    info!(order_id = %id, "Order marked paid, ledger updated");
                    return Ok(updated);
                }
                Err(StoreError::Conflict(doc)) => {
                    debug!(%doc, "Order update conflict, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(OrderDeskError::ConflictRetryExhausted {
            attempts: self.max_commit_attempts,
        })
    }
}

impl_doc_client!(OrderDeskClient, Order, OrderDeskError, order);
