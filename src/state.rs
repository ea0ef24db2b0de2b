use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, DishService, LogNotifier, Notifier, OrderService, SeaOrmAuthService,
    SeaOrmDishService, SeaOrmOrderService, SmtpNotifier, TokenService,
};

/// Shared handles for the whole process: one store pool, one token
/// service, one notifier, and the domain services built over them.
#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub notifier: Arc<dyn Notifier>,

    pub auth_service: Arc<dyn AuthService>,

    pub dish_service: Arc<dyn DishService>,

    pub order_service: Arc<dyn OrderService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.database.path,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        let tokens = Arc::new(TokenService::new(&config.auth));

        let notifier: Arc<dyn Notifier> = if config.email.enabled {
            Arc::new(SmtpNotifier::new(&config.email)?)
        } else {
            Arc::new(LogNotifier)
        };

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            notifier.clone(),
            config.auth.clone(),
        )) as Arc<dyn AuthService>;

        let dish_service = Arc::new(SeaOrmDishService::new(store.clone())) as Arc<dyn DishService>;

        let order_service = Arc::new(SeaOrmOrderService::new(
            store.clone(),
            notifier.clone(),
            config.orders.clone(),
        )) as Arc<dyn OrderService>;

        Ok(Self {
            config,
            store,
            tokens,
            notifier,
            auth_service,
            dish_service,
            order_service,
        })
    }
}
