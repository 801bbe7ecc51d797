use chrono::Utc;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::auth::{AccessError, Caller};
use crate::domain::{Product, ProductCreate, ProductFilter, ProductPatch};
use crate::impl_doc_client;
use crate::store::{DocRef, StoreClient, StoreError, Transaction, Write};

/// Errors from catalog operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("product not found: {0}")]
    NotFound(String),
    #[error("invalid product data: {0}")]
    Invalid(String),
    #[error("admin role required")]
    AdminRequired,
    #[error("restock could not be committed after {attempts} attempts")]
    ConflictRetryExhausted { attempts: u32 },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id, .. } => CatalogError::NotFound(id),
            StoreError::Invalid(msg) => CatalogError::Invalid(msg),
            StoreError::Closed(msg) => CatalogError::StoreUnavailable(msg),
            other => CatalogError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<AccessError> for CatalogError {
    fn from(_: AccessError) -> Self {
        CatalogError::AdminRequired
    }
}

/// Client for catalog management. Edits are last-write-wins; only the
/// stock counter gets the version-checked treatment, since the order
/// transaction contends on it.
#[derive(Clone)]
pub struct CatalogClient {
    store: StoreClient,
    max_commit_attempts: u32,
}

impl CatalogClient {
    pub fn new(store: StoreClient, max_commit_attempts: u32) -> Self {
        Self {
            store,
            max_commit_attempts,
        }
    }

    #[instrument(skip(self, caller, payload), fields(caller = %caller.id, sku = %payload.sku))]
    pub async fn create_product(
        &self,
        caller: &Caller,
        payload: ProductCreate,
    ) -> Result<String, CatalogError> {
        debug!("Sending request");
        Ok(self.store.create::<Product>(payload).await?)
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, CatalogError> {
        debug!("Sending request");
        Ok(self.store.list::<Product>(filter).await?)
    }

    #[instrument(skip(self, caller, patch), fields(caller = %caller.id))]
    pub async fn update_product(
        &self,
        caller: &Caller,
        id: &str,
        patch: ProductPatch,
    ) -> Result<Product, CatalogError> {
        debug!("Sending request");
        Ok(self.store.patch::<Product>(id, patch).await?)
    }

    /// Manual restock: adds `additional` units on top of the live count.
    /// Version-checked so a concurrent order decrement is never lost.
    #[instrument(skip(self, caller), fields(caller = %caller.id))]
    pub async fn restock(
        &self,
        caller: &Caller,
        id: &str,
        additional: u32,
    ) -> Result<Product, CatalogError> {
        debug!("Sending request");
        for _ in 0..self.max_commit_attempts {
            let Some((product, version)) = self.store.get::<Product>(id).await? else {
                return Err(CatalogError::NotFound(id.to_string()));
            };

            let mut updated = product;
            updated.set_stock(updated.stock.saturating_add(additional));
            updated.updated_at = Utc::now();

            let mut tx = Transaction::new();
            tx.require(DocRef::Product(id.to_string()), version);
            tx.write(Write::PutProduct(updated.clone()));

            match self.store.commit(tx).await {
                Ok(()) => return Ok(updated),
                Err(StoreError::Conflict(doc)) => {
                    debug!(%doc, "Restock conflict, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(CatalogError::ConflictRetryExhausted {
            attempts: self.max_commit_attempts,
        })
    }
}

impl_doc_client!(CatalogClient, Product, CatalogError, product);
