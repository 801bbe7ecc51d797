//! [`Document`] wiring for the three stored collections.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    Customer, CustomerCreate, CustomerFilter, CustomerPatch, Order, OrderFilter, OrderPatch,
    Product, ProductCreate, ProductFilter, ProductPatch, ProductStatus,
};

use super::document::{Collection, Document};
use super::messages::{DocRequest, StoreRequest};

impl Document for Product {
    type CreatePayload = ProductCreate;
    type Patch = ProductPatch;
    type Filter = ProductFilter;

    const COLLECTION: &'static str = "products";
    const ID_PREFIX: &'static str = "product_";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_create(
        id: String,
        payload: ProductCreate,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        if payload.name.trim().is_empty() {
            return Err("product name is required".to_string());
        }
        if payload.sku.trim().is_empty() {
            return Err("product sku is required".to_string());
        }
        if payload.price < Decimal::ZERO {
            return Err(format!("product price cannot be negative: {}", payload.price));
        }
        let status = if payload.stock == 0 {
            ProductStatus::OutOfStock
        } else {
            ProductStatus::Active
        };
        Ok(Self {
            id,
            name: payload.name,
            sku: payload.sku,
            description: payload.description,
            price: payload.price,
            stock: payload.stock,
            status,
            category: payload.category,
            featured: payload.featured,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(price) = patch.price {
            if price < Decimal::ZERO {
                return Err(format!("product price cannot be negative: {price}"));
            }
            self.price = price;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        // set_stock reconciles status with the final stock level, so an
        // explicit active/out_of_stock write never contradicts it.
        let stock = patch.stock.unwrap_or(self.stock);
        self.set_stock(stock);
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &ProductFilter) -> bool {
        Product::matches(self, filter)
    }
}

impl Collection for Product {
    fn into_request(request: DocRequest<Self>) -> StoreRequest {
        StoreRequest::Product(request)
    }
}

impl Document for Order {
    // Orders are only written through the transaction commit path; direct
    // inserts are refused.
    type CreatePayload = ();
    type Patch = OrderPatch;
    type Filter = OrderFilter;

    const COLLECTION: &'static str = "orders";
    const ID_PREFIX: &'static str = "order_";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_create(_id: String, _payload: (), _now: DateTime<Utc>) -> Result<Self, String> {
        Err("orders are created through the order transaction".to_string())
    }

    fn apply_patch(&mut self, patch: OrderPatch, now: DateTime<Utc>) -> Result<(), String> {
        Order::apply_patch(self, &patch, now)
    }

    fn matches(&self, filter: &OrderFilter) -> bool {
        Order::matches(self, filter)
    }
}

impl Collection for Order {
    fn into_request(request: DocRequest<Self>) -> StoreRequest {
        StoreRequest::Order(request)
    }
}

impl Document for Customer {
    type CreatePayload = CustomerCreate;
    type Patch = CustomerPatch;
    type Filter = CustomerFilter;

    const COLLECTION: &'static str = "customers";
    const ID_PREFIX: &'static str = "customer_";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_create(
        id: String,
        payload: CustomerCreate,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        if !payload.email.contains('@') {
            return Err(format!("invalid customer email: {}", payload.email));
        }
        Ok(Self {
            id,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            orders: Vec::new(),
            total_spent: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: CustomerPatch, now: DateTime<Utc>) -> Result<(), String> {
        if let Some(email) = patch.email {
            if !email.contains('@') {
                return Err(format!("invalid customer email: {email}"));
            }
            self.email = email;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        self.updated_at = now;
        Ok(())
    }

    fn matches(&self, filter: &CustomerFilter) -> bool {
        Customer::matches(self, filter)
    }
}

impl Collection for Customer {
    fn into_request(request: DocRequest<Self>) -> StoreRequest {
        StoreRequest::Customer(request)
    }
}
