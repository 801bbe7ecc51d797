use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Address;

/// Who the order is for: an existing ledger record, or an email+name pair
/// for the quick-order path (the record is created in the same atomic unit
/// when the email is unknown).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerRef {
    Existing(String),
    Email {
        email: String,
        first_name: String,
        last_name: String,
    },
}

/// One requested line. Unit prices are deliberately absent: they come from
/// the live product documents, never from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// A proposed order as submitted by the boundary layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer: CustomerRef,
    pub items: Vec<OrderItemRequest>,
    pub shipping_cost: Decimal,
    /// Client-computed grand total, verified against live prices before
    /// anything is written.
    pub total: Decimal,
    pub shipping_address: Address,
    pub billing_address: Address,
    /// Caller-generated dedup token for retried submissions.
    pub idempotency_key: Option<String>,
}
