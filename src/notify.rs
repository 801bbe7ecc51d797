//! Notification dispatch. One message per committed order, consumed by a
//! background actor; delivery is best-effort and never feeds back into the
//! transaction that produced it.

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::domain::Order;

/// A committed order worth telling people about. The dispatcher fans this
/// out to the customer confirmation and the staff alert.
#[derive(Debug, Clone)]
pub struct Notification {
    pub order_id: String,
    pub customer_email: String,
    pub total: Decimal,
}

/// Fire-and-forget sending half, held by the order processor.
#[derive(Clone)]
pub struct Notifier {
    sender: mpsc::Sender<Notification>,
}

impl Notifier {
    pub fn new(sender: mpsc::Sender<Notification>) -> Self {
        Self { sender }
    }

    /// Enqueues without blocking; a full or closed queue drops the message
    /// with a warning. The order stands either way.
    pub fn order_confirmed(&self, order: &Order) {
        let notification = Notification {
            order_id: order.id.clone(),
            customer_email: order.customer_email.clone(),
            total: order.total,
        };
        if let Err(e) = self.sender.try_send(notification) {
            warn!(error = %e, order_id = %order.id, "Dropping order notification");
        }
    }
}

/// Background actor draining the notification queue.
pub struct NotificationDispatcher {
    receiver: mpsc::Receiver<Notification>,
}

impl NotificationDispatcher {
    pub fn new(buffer_size: usize) -> (Self, Notifier) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self { receiver }, Notifier::new(sender))
    }

    #[instrument(name = "notification_dispatcher", skip(self))]
    pub async fn run(mut self) {
        info!("Notification dispatcher starting");

        while let Some(notification) = self.receiver.recv().await {
            self.deliver(notification);
        }

        info!("Notification dispatcher stopped");
    }

    /// Hands the payloads to the delivery backend. Wire transport is out of
    /// scope here; the payload logged is what the mailer receives.
    fn deliver(&self, notification: Notification) {
        let confirmation = serde_json::json!({
            "template": "order-confirmation",
            "to": notification.customer_email,
            "order_id": notification.order_id,
            "total": notification.total,
        });
        info!(payload = %confirmation, "Dispatching customer confirmation");

        let staff_alert = serde_json::json!({
            "template": "new-order-alert",
            "to": "orders@juniperandsloe.example",
            "order_id": notification.order_id,
            "total": notification.total,
        });
        info!(payload = %staff_alert, "Dispatching staff alert");
    }
}
