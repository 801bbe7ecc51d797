use tracing::{error, info};

use crate::clients::{CatalogClient, CustomerClient, OrderDeskClient};
use crate::config::Config;
use crate::notify::NotificationDispatcher;
use crate::processor::OrderProcessor;
use crate::store::StoreActor;

/// The running back office: the store and notification actors plus the
/// clients wired over them.
pub struct Backoffice {
    pub catalog: CatalogClient,
    pub customers: CustomerClient,
    pub orders: OrderDeskClient,
    pub processor: OrderProcessor,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Backoffice {
    pub fn start(config: Config) -> Self {
        info!(?config, "Starting back office");

        let (store_actor, store) = StoreActor::new(config.store_buffer);
        let store_handle = tokio::spawn(store_actor.run());

        let (dispatcher, notifier) = NotificationDispatcher::new(config.notify_buffer);
        let dispatcher_handle = tokio::spawn(dispatcher.run());

        let catalog = CatalogClient::new(store.clone(), config.max_commit_attempts);
        let customers = CustomerClient::new(store.clone());
        let orders = OrderDeskClient::new(
            store.clone(),
            config.spend_policy,
            config.max_commit_attempts,
        );
        let processor = OrderProcessor::new(store, notifier, &config);

        Self {
            catalog,
            customers,
            orders,
            processor,
            handles: vec![store_handle, dispatcher_handle],
        }
    }

    /// Dropping every client closes the actor channels; the actors drain
    /// their queues and exit.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down back office...");

        drop(self.catalog);
        drop(self.customers);
        drop(self.orders);
        drop(self.processor);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Back office shutdown complete.");
        Ok(())
    }
}
