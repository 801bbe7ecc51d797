mod app_system;
mod auth;
mod clients;
mod config;
mod domain;
mod notify;
mod processor;
mod store;

#[cfg(test)]
mod mock_framework;

use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use crate::app_system::{setup_tracing, Backoffice};
use crate::auth::Caller;
use crate::config::Config;
use crate::domain::{
    Address, CustomerCreate, CustomerFilter, OrderFilter, OrderPatch, PaymentStatus,
    ProductCreate, ProductFilter, ProductPatch,
};
use crate::processor::{CustomerRef, OrderItemRequest, OrderRequest};

fn demo_address() -> Address {
    Address {
        line1: "14 Still Lane".to_string(),
        line2: None,
        city: "Bristol".to_string(),
        postcode: "BS1 4QA".to_string(),
        country: "GB".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("Starting back office");
    let system = Backoffice::start(Config::load());
    let staff = Caller::standard("staff_demo");
    let admin = Caller::admin("admin_demo");

    // Seed the catalog
    let gin_id = system
        .catalog
        .create_product(
            &staff,
            ProductCreate {
                name: "Juniper & Sloe London Dry".to_string(),
                sku: "GIN-LD-70".to_string(),
                description: "Flagship London Dry, 70cl".to_string(),
                price: Decimal::new(2800, 2),
                stock: 12,
                category: "london-dry".to_string(),
                featured: true,
            },
        )
        .await
        .map_err(|e| e.to_string())?;

    let retired_id = system
        .catalog
        .create_product(
            &staff,
            ProductCreate {
                name: "Winter Spice 2024".to_string(),
                sku: "GIN-WS-50".to_string(),
                description: "Seasonal release, 50cl".to_string(),
                price: Decimal::new(2400, 2),
                stock: 0,
                category: "seasonal".to_string(),
                featured: false,
            },
        )
        .await
        .map_err(|e| e.to_string())?;

    info!(product_id = %gin_id, "Catalog seeded");

    // Price correction on the flagship bottle
    system
        .catalog
        .update_product(
            &staff,
            &gin_id,
            ProductPatch {
                price: Some(Decimal::new(2950, 2)),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| e.to_string())?;

    let customer_id = system
        .customers
        .create_customer(
            &staff,
            CustomerCreate {
                email: "alice@example.com".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Archer".to_string(),
            },
        )
        .await
        .map_err(|e| e.to_string())?;

    info!(customer_id = %customer_id, "Customer created successfully");

    // Two bottles plus shipping: 2 x 29.50 + 4.95
    let request = OrderRequest {
        customer: CustomerRef::Existing(customer_id),
        items: vec![OrderItemRequest {
            product_id: gin_id.clone(),
            quantity: 2,
        }],
        shipping_cost: Decimal::new(495, 2),
        total: Decimal::new(6395, 2),
        shipping_address: demo_address(),
        billing_address: demo_address(),
        idempotency_key: Some("demo-order-1".to_string()),
    };

    let span = tracing::info_span!("order_processing");
    let order_result = async {
        info!("Processing order through the transaction processor");
        system.processor.create_order(&staff, request).await
    }
    .instrument(span)
    .await;

    match order_result {
        Ok(order_id) => {
            info!(order_id = %order_id, "Order processed successfully");
            // Payment confirmation comes in from the desk
            system
                .orders
                .update_order(
                    &staff,
                    &order_id,
                    OrderPatch {
                        payment_status: Some(PaymentStatus::Paid),
                        ..Default::default()
                    },
                )
                .await
                .map_err(|e| e.to_string())?;
            info!(order_id = %order_id, "Order marked paid");
        }
        Err(e) => error!(error = %e, "Order processing failed"),
    }

    // Quick order for an email with no ledger record yet: 1 x 29.50 + 4.95
    let quick = OrderRequest {
        customer: CustomerRef::Email {
            email: "bob@example.com".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Breaker".to_string(),
        },
        items: vec![OrderItemRequest {
            product_id: gin_id.clone(),
            quantity: 1,
        }],
        shipping_cost: Decimal::new(495, 2),
        total: Decimal::new(3445, 2),
        shipping_address: demo_address(),
        billing_address: demo_address(),
        idempotency_key: None,
    };
    match system.processor.create_order(&staff, quick).await {
        Ok(order_id) => info!(order_id = %order_id, "Quick order processed successfully"),
        Err(e) => error!(error = %e, "Quick order failed"),
    }

    if let Some(bob) = system
        .customers
        .find_customer_by_email("bob@example.com")
        .await
        .map_err(|e| e.to_string())?
    {
        info!(customer_id = %bob.id, segment = ?bob.segment(), "Quick-order customer on file");
    }

    // More than the remaining stock; rejected with the product named
    let oversized = OrderRequest {
        customer: CustomerRef::Email {
            email: "bob@example.com".to_string(),
            first_name: "Bob".to_string(),
            last_name: "Breaker".to_string(),
        },
        items: vec![OrderItemRequest {
            product_id: gin_id.clone(),
            quantity: 50,
        }],
        shipping_cost: Decimal::ZERO,
        total: Decimal::new(147500, 2),
        shipping_address: demo_address(),
        billing_address: demo_address(),
        idempotency_key: None,
    };
    match system.processor.create_order(&staff, oversized).await {
        Ok(order_id) => info!(order_id = %order_id, "Order processed successfully"),
        Err(e) => error!(error = %e, "Order processing failed (expected - demand exceeds stock)"),
    }

    // Delivery arrived from the distillery
    let restocked = system
        .catalog
        .restock(&staff, &gin_id, 24)
        .await
        .map_err(|e| e.to_string())?;
    info!(stock = restocked.stock, "Flagship restocked");

    let featured = system
        .catalog
        .list_products(ProductFilter {
            featured: Some(true),
            ..Default::default()
        })
        .await
        .map_err(|e| e.to_string())?;
    info!(product_count = featured.len(), "Retrieved featured products");

    let open_orders = system
        .orders
        .list_orders(OrderFilter::default())
        .await
        .map_err(|e| e.to_string())?;
    info!(order_count = open_orders.len(), "Orders on the books");

    let customers = system
        .customers
        .list_customers(CustomerFilter::default())
        .await
        .map_err(|e| e.to_string())?;
    info!(customer_count = customers.len(), "Customers on file");

    // Retire last winter's seasonal bottle; historical orders keep their
    // denormalized name and price.
    system
        .catalog
        .delete_product(&admin, &retired_id)
        .await
        .map_err(|e| e.to_string())?;
    info!(product_id = %retired_id, "Retired seasonal product removed");

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
