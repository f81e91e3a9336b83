pub mod accounts;
pub mod carts;
pub mod common;
pub mod coupons;
pub mod orders;
pub mod products;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<crate::services::UserService>,
    pub catalog: Arc<crate::services::CatalogService>,
    pub carts: Arc<crate::services::CartService>,
    pub coupons: Arc<crate::services::CouponService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        let users = Arc::new(crate::services::UserService::new(
            db_pool.clone(),
            event_sender.clone(),
            config,
        ));
        let catalog = Arc::new(crate::services::CatalogService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let carts = Arc::new(crate::services::CartService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let coupons = Arc::new(crate::services::CouponService::new(db_pool, event_sender));

        Self {
            users,
            catalog,
            carts,
            coupons,
        }
    }
}
