use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived marketing segment. Thresholds are display logic, not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    New,
    Regular,
    Vip,
}

const VIP_SPEND: u32 = 1_000;
const VIP_ORDERS: usize = 10;
const REGULAR_ORDERS: usize = 3;

/// A customer ledger record: identity plus order history and running spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub orders: Vec<String>,
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn segment(&self) -> CustomerSegment {
        if self.total_spent >= Decimal::from(VIP_SPEND) || self.orders.len() >= VIP_ORDERS {
            CustomerSegment::Vip
        } else if self.orders.len() >= REGULAR_ORDERS {
            CustomerSegment::Regular
        } else {
            CustomerSegment::New
        }
    }

    /// Appends an order to the history and adds `amount` to the running
    /// spend. `amount` is zero when the spend policy defers to payment time.
    pub fn record_order(&mut self, order_id: String, amount: Decimal, now: DateTime<Utc>) {
        self.orders.push(order_id);
        self.total_spent += amount;
        self.updated_at = now;
    }

    /// Adds a paid order's total to the running spend without touching the
    /// order list (the id was appended at creation time).
    pub fn add_spend(&mut self, amount: Decimal, now: DateTime<Utc>) {
        self.total_spent += amount;
        self.updated_at = now;
    }
}

/// Payload for creating a customer record, either at registration or
/// implicitly through the quick-order path.
#[derive(Debug, Clone)]
pub struct CustomerCreate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Payload for updating customer contact details.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Listing filter; `search` matches case-insensitively over email and name.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub segment: Option<CustomerSegment>,
    pub search: Option<String>,
}

impl Customer {
    pub fn matches(&self, filter: &CustomerFilter) -> bool {
        if let Some(segment) = filter.segment {
            if self.segment() != segment {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            let hit = self.email.to_lowercase().contains(&needle)
                || self.first_name.to_lowercase().contains(&needle)
                || self.last_name.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Customer {
        let now = Utc::now();
        Customer {
            id: "customer_1".to_string(),
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Archer".to_string(),
            orders: Vec::new(),
            total_spent: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn segments_derive_from_spend_and_count() {
        let mut customer = sample();
        assert_eq!(customer.segment(), CustomerSegment::New);

        for n in 0..3 {
            customer.record_order(format!("order_{n}"), dec!(20), Utc::now());
        }
        assert_eq!(customer.segment(), CustomerSegment::Regular);

        customer.add_spend(dec!(1500), Utc::now());
        assert_eq!(customer.segment(), CustomerSegment::Vip);
    }

    #[test]
    fn record_order_appends_and_accumulates() {
        let mut customer = sample();
        customer.record_order("order_9".to_string(), dec!(60.95), Utc::now());
        assert_eq!(customer.orders, vec!["order_9".to_string()]);
        assert_eq!(customer.total_spent, dec!(60.95));
    }
}
