//! Test utilities: a store client whose receiving end the test holds, so
//! client logic can be exercised against scripted store behavior
//! (conflicts, delays, failures) without a running store task.

use tokio::sync::mpsc;

use crate::domain::{Customer, Product};
use crate::store::{DocRequest, Response, StoreClient, StoreRequest, Transaction, Version};

/// Returns a client and the receiver its requests arrive on. The test
/// inspects each request and answers through its oneshot channel.
pub fn create_mock_store(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

pub async fn expect_product_get(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, Response<Option<(Product, Version)>>)> {
    match receiver.recv().await {
        Some(StoreRequest::Product(DocRequest::Get { id, respond_to })) => Some((id, respond_to)),
        _ => None,
    }
}

pub async fn expect_customer_get(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, Response<Option<(Customer, Version)>>)> {
    match receiver.recv().await {
        Some(StoreRequest::Customer(DocRequest::Get { id, respond_to })) => Some((id, respond_to)),
        _ => None,
    }
}

pub async fn expect_allocate_id(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(&'static str, Response<String>)> {
    match receiver.recv().await {
        Some(StoreRequest::AllocateId { prefix, respond_to }) => Some((prefix, respond_to)),
        _ => None,
    }
}

pub async fn expect_commit(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(Transaction, Response<()>)> {
    match receiver.recv().await {
        Some(StoreRequest::Commit {
            transaction,
            respond_to,
        }) => Some((transaction, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_round_trip() {
        let (client, mut receiver) = create_mock_store(4);

        let get_task = tokio::spawn(async move { client.get::<Product>("product_1").await });

        let (id, responder) = expect_product_get(&mut receiver)
            .await
            .expect("expected product get");
        assert_eq!(id, "product_1");
        responder.send(Ok(None)).unwrap();

        assert_eq!(get_task.await.unwrap(), Ok(None));
    }
}
