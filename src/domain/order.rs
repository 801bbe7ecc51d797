use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fulfilment status of an order. Orders move forward through
/// `Pending -> Processing -> Shipped -> Delivered`; cancellation is only
/// possible before shipment. `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Payment state of an order. A failed charge may be retried; refunds are
/// only possible after payment. `Refunded` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Pending, Failed) | (Failed, Paid) | (Paid, Refunded)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

/// Postal address captured on the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
}

/// One order line. Product name and unit price are denormalized at order
/// time so catalog edits and deletions never rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// A committed customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub customer_email: String,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff-side partial update: fulfilment and payment status only.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl Order {
    /// Applies a staff patch, rejecting transitions outside the allowed
    /// progressions.
    pub fn apply_patch(&mut self, patch: &OrderPatch, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(next) = patch.status {
            if !self.status.can_transition_to(next) {
                return Err(format!("order cannot move from {} to {}", self.status, next));
            }
            self.status = next;
        }
        if let Some(next) = patch.payment_status {
            if !self.payment_status.can_transition_to(next) {
                return Err(format!(
                    "payment cannot move from {} to {}",
                    self.payment_status, next
                ));
            }
            self.payment_status = next;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Listing filter for the order desk.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<String>,
}

impl Order {
    pub fn matches(&self, filter: &OrderFilter) -> bool {
        if let Some(status) = filter.status {
            if self.status != status {
                return false;
            }
        }
        if let Some(payment) = filter.payment_status {
            if self.payment_status != payment {
                return false;
            }
        }
        if let Some(customer_id) = &filter.customer_id {
            if &self.customer_id != customer_id {
                return false;
            }
        }
        true
    }
}
