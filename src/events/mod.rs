use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services and consumed by a background task.
///
/// Consumers are fire-and-forget: a full or closed channel never fails the
/// request that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order lifecycle
    OrderPlaced(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderItemCancelled {
        order_id: Uuid,
        order_item_id: Uuid,
    },
    OrderCancelled(Uuid),
    OrderForwarded {
        order_id: Uuid,
        vendor_order_ids: Vec<Uuid>,
    },

    // Vendor order lifecycle
    VendorOrderStatusChanged {
        vendor_order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    VendorOrderCancelled(Uuid),

    // Commissions
    CommissionAccrued {
        vendor_order_id: Uuid,
        vendor_id: Uuid,
    },
    CommissionSettled(Uuid),
    CommissionReversed(Uuid),

    // Inquiries
    InquiryOpened(Uuid),
    InquiryReplied {
        inquiry_id: Uuid,
        staff_reply: bool,
    },
    InquiryStatusChanged {
        inquiry_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Catalog
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Accounts
    UserRegistered(Uuid),
    VendorCreated(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {}", e))
    }

    /// Sends an event and logs instead of propagating when the channel is
    /// unavailable.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("event dropped: {}", e);
        }
    }
}

/// Creates the event channel used to wire services to the consumer task.
pub fn event_channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Background consumer. Currently logs each event; side effects such as
/// notification fan-out hang off this loop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderPlaced(id) => info!(order_id = %id, "order placed"),
            Event::OrderForwarded {
                order_id,
                vendor_order_ids,
            } => info!(
                order_id = %order_id,
                vendor_orders = vendor_order_ids.len(),
                "order forwarded to vendors"
            ),
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => info!(
                order_id = %order_id,
                from = %old_status,
                to = %new_status,
                "order status changed"
            ),
            Event::InquiryReplied {
                inquiry_id,
                staff_reply,
            } => info!(inquiry_id = %inquiry_id, staff_reply, "inquiry replied"),
            other => info!(event = ?other, "event processed"),
        }
    }
    info!("event channel closed, consumer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (sender, mut rx) = event_channel(8);
        sender
            .send(Event::OrderPlaced(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(matches!(rx.recv().await, Some(Event::OrderPlaced(_))));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (sender, rx) = event_channel(1);
        drop(rx);
        sender.send_or_log(Event::OrderCancelled(Uuid::new_v4())).await;
    }
}
