use crate::{
    auth::TokenIssuer,
    config::Config,
    services::{AccountService, OrderService, OrderSettings, TrackingService},
    stores::Stores,
};

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub tokens: TokenIssuer,
    pub orders: OrderService,
    pub accounts: AccountService,
    pub tracking: TrackingService,
}

impl AppState {
    pub fn new(config: &Config, stores: Stores) -> Self {
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl);
        let orders = OrderService::new(
            &stores,
            OrderSettings {
                pricing: config.orders.pricing,
                decrement_stock: config.orders.decrement_stock,
                transaction_timeout: config.database.transaction_timeout,
            },
        );
        let accounts = AccountService::new(stores.accounts.clone(), tokens.clone());
        let tracking = TrackingService::new(stores.activities.clone(), stores.accounts.clone());

        Self {
            stores,
            tokens,
            orders,
            accounts,
            tracking,
        }
    }
}
