use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event; a closed channel is logged and otherwise ignored.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping domain event");
        }
    }
}

/// Domain events emitted after a write commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    UserRegistered(Uuid),
    UserRoleChanged { user_id: Uuid, role: String },
    UserStatusChanged { user_id: Uuid, is_active: bool },

    StoreApplied(Uuid),
    StoreStatusChanged { store_id: Uuid, status: String },

    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    LowStock { product_id: Uuid, stock: i32 },

    PromotionRedeemed { promotion_id: Uuid, order_id: Uuid },
    FlashSaleReserved { item_id: Uuid, user_id: Uuid, quantity: i32 },

    OrderPlaced { order_id: Uuid, store_id: Uuid, total: Decimal },
    OrderStatusChanged { order_id: Uuid, status: String },
    OrderCancelled(Uuid),

    ShipmentCreated(Uuid),
    ShipmentStatusChanged { shipment_id: Uuid, status: String },

    AffiliateApplied(Uuid),
    CommissionRecorded { commission_id: Uuid, affiliate_id: Uuid, amount: Decimal },
    CommissionStatusChanged { commission_id: Uuid, status: String },
}

/// Creates the event channel with the configured capacity.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender::new(tx), rx)
}

/// Drains the channel, logging each event until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::LowStock { product_id, stock } => {
                warn!(%product_id, stock, "Product stock is running low");
            }
            Event::OrderPlaced {
                order_id,
                store_id,
                total,
            } => {
                info!(%order_id, %store_id, %total, "Order placed");
            }
            other => info!(event = ?other, "Domain event"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_the_channel() {
        let (sender, mut rx) = channel(4);
        let id = Uuid::new_v4();
        sender.send(Event::OrderCancelled(id)).await.unwrap();
        assert_eq!(rx.recv().await, Some(Event::OrderCancelled(id)));
    }

    #[tokio::test]
    async fn send_or_log_tolerates_closed_channel() {
        let (sender, rx) = channel(1);
        drop(rx);
        sender.send_or_log(Event::StoreApplied(Uuid::new_v4())).await;
        assert!(sender.send(Event::StoreApplied(Uuid::new_v4())).await.is_err());
    }
}
