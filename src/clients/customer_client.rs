use thiserror::Error;
use tracing::{debug, instrument};

use crate::auth::{AccessError, Caller};
use crate::domain::{Customer, CustomerCreate, CustomerFilter, CustomerPatch};
use crate::impl_doc_client;
use crate::store::{StoreClient, StoreError};

/// Errors from customer ledger operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CustomerError {
    #[error("customer not found: {0}")]
    NotFound(String),
    #[error("invalid customer data: {0}")]
    Invalid(String),
    #[error("admin role required")]
    AdminRequired,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for CustomerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id, .. } => CustomerError::NotFound(id),
            StoreError::Invalid(msg) => CustomerError::Invalid(msg),
            StoreError::Closed(msg) => CustomerError::StoreUnavailable(msg),
            other => CustomerError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<AccessError> for CustomerError {
    fn from(_: AccessError) -> Self {
        CustomerError::AdminRequired
    }
}

/// Client for customer records. The append-order/add-spend mutation is not
/// exposed here; it only happens inside the order transaction. Deletion is
/// a hard admin action with no cascade to historical orders.
#[derive(Clone)]
pub struct CustomerClient {
    store: StoreClient,
}

impl CustomerClient {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    #[instrument(skip(self, caller, payload), fields(caller = %caller.id, email = %payload.email))]
    pub async fn create_customer(
        &self,
        caller: &Caller,
        payload: CustomerCreate,
    ) -> Result<String, CustomerError> {
        debug!("Sending request");
        Ok(self.store.create::<Customer>(payload).await?)
    }

    #[instrument(skip(self))]
    pub async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Customer>, CustomerError> {
        debug!("Sending request");
        let found = self.store.find_customer_by_email(email).await?;
        Ok(found.map(|(customer, _version)| customer))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        filter: CustomerFilter,
    ) -> Result<Vec<Customer>, CustomerError> {
        debug!("Sending request");
        Ok(self.store.list::<Customer>(filter).await?)
    }

    #[instrument(skip(self, caller, patch), fields(caller = %caller.id))]
    #[allow(dead_code)]
    pub async fn update_customer(
        &self,
        caller: &Caller,
        id: &str,
        patch: CustomerPatch,
    ) -> Result<Customer, CustomerError> {
        debug!("Sending request");
        Ok(self.store.patch::<Customer>(id, patch).await?)
    }
}

impl_doc_client!(CustomerClient, Customer, CustomerError, customer);
