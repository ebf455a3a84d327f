use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Domain events emitted by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    SparepartCreated(Uuid),
    SparepartUpdated(Uuid),
    SparepartDeleted(Uuid),

    PurchaseCreated(Uuid),
    PurchaseUpdated(Uuid),
    PurchaseDeleted(Uuid),

    UnitsAssembled { product_id: Uuid, count: usize },
    UnitTested { unit_id: Uuid, status: String },
    UnitDeleted(Uuid),

    SaleCreated(Uuid),
    SaleUpdated(Uuid),
    SaleDeleted(Uuid),

    ServiceOrderReceived(Uuid),
    ServiceDeliveryCreated(Uuid),

    CustomerCreated(Uuid),
    VendorCreated(Uuid),
    TechnicianCreated(Uuid),
}

/// Bounded sender handed to every service.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
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

    /// Sends an event, logging (not surfacing) failures. Event delivery
    /// must never fail a request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event delivery failed: {}", e);
        }
    }
}

/// Consumes the event channel, logging each event.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "domain event");
    }
    info!("Event channel closed; processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel_errors() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic even though the receiver is gone.
        sender.send_or_log(Event::ProductCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::UnitTested {
                unit_id: Uuid::new_v4(),
                status: "pass".into(),
            })
            .await
            .unwrap();
        assert!(matches!(rx.recv().await, Some(Event::UnitTested { .. })));
    }
}
