use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
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

    /// Sends an event and logs a warning instead of failing when the
    /// receiving side is gone. Domain writes must not fail because the
    /// event loop stopped.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

// The various events that can occur in the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Account events
    UserRegistered(Uuid),
    UserUpdated(Uuid),
    AddressCreated { user_id: Uuid, address_id: Uuid },
    AddressUpdated { user_id: Uuid, address_id: Uuid },
    AddressRemoved { user_id: Uuid, address_id: Uuid },

    // Catalog events
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted(Uuid),
    BrandCreated(Uuid),
    BrandUpdated(Uuid),
    BrandDeleted(Uuid),
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    ProductImageAdded { product_id: Uuid, image_id: Uuid },
    ProductImageRemoved { product_id: Uuid, image_id: Uuid },
    MainImageChanged { product_id: Uuid, image_id: Uuid },

    // Cart events
    CartCreated(Uuid),
    CartItemAdded { cart_id: Uuid, product_id: Uuid },
    CartItemUpdated { cart_id: Uuid, product_id: Uuid },
    CartItemRemoved { cart_id: Uuid, product_id: Uuid },
    CartCleared(Uuid),

    // Coupon events
    CouponCreated(Uuid),
    CouponRedeemed { coupon_id: Uuid, discount: Decimal },
}

/// Consumes events from the channel and logs them. A full-grown deployment
/// would fan these out to webhooks or a message queue; the storefront only
/// needs the audit trail for now.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::UserRegistered(id) => info!(user_id = %id, "user registered"),
            Event::CartCreated(id) => info!(cart_id = %id, "cart created"),
            Event::CartCleared(id) => info!(cart_id = %id, "cart cleared"),
            Event::CartItemAdded {
                cart_id,
                product_id,
            } => info!(cart_id = %cart_id, product_id = %product_id, "cart item added"),
            Event::ProductCreated(id) => info!(product_id = %id, "product created"),
            Event::ProductDeleted(id) => info!(product_id = %id, "product deleted"),
            Event::CouponRedeemed {
                coupon_id,
                discount,
            } => info!(coupon_id = %coupon_id, %discount, "coupon redeemed"),
            other => debug!(event = ?other, "event processed"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender
            .send(Event::CartCreated(Uuid::new_v4()))
            .await
            .expect("send should succeed");

        assert!(matches!(rx.recv().await, Some(Event::CartCreated(_))));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out.
        sender.send_or_log(Event::CartCleared(Uuid::new_v4())).await;
    }
}
