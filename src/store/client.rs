use tokio::sync::{mpsc, oneshot};

use crate::domain::Customer;

use super::document::{Collection, Version};
use super::error::StoreError;
use super::messages::{DocRequest, Response, StoreRequest};
use super::transaction::Transaction;

/// Cloneable handle to the store actor. Every method is one
/// request/oneshot-response round trip; a closed channel surfaces as
/// [`StoreError::Closed`].
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    async fn send<R>(
        &self,
        build: impl FnOnce(Response<R>) -> StoreRequest,
    ) -> Result<R, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::Closed("store closed".to_string()))?;
        response
            .await
            .map_err(|_| StoreError::Closed("store dropped".to_string()))?
    }

    pub async fn create<T: Collection>(
        &self,
        payload: T::CreatePayload,
    ) -> Result<String, StoreError> {
        self.send(|respond_to| {
            T::into_request(DocRequest::Create {
                payload,
                respond_to,
            })
        })
        .await
    }

    pub async fn get<T: Collection>(&self, id: &str) -> Result<Option<(T, Version)>, StoreError> {
        let id = id.to_string();
        self.send(|respond_to| T::into_request(DocRequest::Get { id, respond_to }))
            .await
    }

    pub async fn list<T: Collection>(&self, filter: T::Filter) -> Result<Vec<T>, StoreError> {
        self.send(|respond_to| T::into_request(DocRequest::List { filter, respond_to }))
            .await
    }

    pub async fn patch<T: Collection>(&self, id: &str, patch: T::Patch) -> Result<T, StoreError> {
        let id = id.to_string();
        self.send(|respond_to| {
            T::into_request(DocRequest::Patch {
                id,
                patch,
                respond_to,
            })
        })
        .await
    }

    pub async fn delete<T: Collection>(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        self.send(|respond_to| T::into_request(DocRequest::Delete { id, respond_to }))
            .await
    }

    pub async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(Customer, Version)>, StoreError> {
        let email = email.to_string();
        self.send(|respond_to| StoreRequest::FindCustomerByEmail { email, respond_to })
            .await
    }

    pub async fn lookup_idempotency_key(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.send(|respond_to| StoreRequest::LookupIdempotencyKey { key, respond_to })
            .await
    }

    /// Allocates a fresh id for `T` ahead of the commit that will insert
    /// the document.
    pub async fn allocate_id<T: Collection>(&self) -> Result<String, StoreError> {
        self.send(|respond_to| StoreRequest::AllocateId {
            prefix: T::ID_PREFIX,
            respond_to,
        })
        .await
    }

    pub async fn commit(&self, transaction: Transaction) -> Result<(), StoreError> {
        self.send(|respond_to| StoreRequest::Commit {
            transaction,
            respond_to,
        })
        .await
    }
}
