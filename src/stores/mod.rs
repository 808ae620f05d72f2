//! Persistence seams used by the services.
//!
//! Each trait maps to one collaborator: the catalog, the accounts, the order
//! tables and the activity log with its sessions. [`postgres::PgStore`]
//! implements all of them on diesel-async; [`memory::MemoryStore`] keeps
//! everything in process for tests and for running without a database.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{
    Account, Activity, Category, NewAccount, NewActivity, NewOrder, NewProduct, NewSession, Order,
    PaymentResult, Product, Session,
};

pub mod memory;
pub mod postgres;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Insufficient stock for product {product_id}")]
    InsufficientStock { product_id: i32 },

    #[error("Email {0} is already registered")]
    DuplicateEmail(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => StoreError::NotFound,
            err => StoreError::Backend(err.into()),
        }
    }
}

pub trait CatalogStore: Send + Sync {
    fn find_product(&self, id: i32) -> BoxFuture<'_, StoreResult<Product>>;

    /// Products matching `ids`; unknown ids are simply absent from the result.
    fn find_products(&self, ids: Vec<i32>) -> BoxFuture<'_, StoreResult<Vec<Product>>>;

    fn list_products(&self, category: Option<Category>) -> BoxFuture<'_, StoreResult<Vec<Product>>>;

    fn create_product(&self, product: NewProduct) -> BoxFuture<'_, StoreResult<Product>>;
}

pub trait AccountStore: Send + Sync {
    fn find_account(&self, id: i32) -> BoxFuture<'_, StoreResult<Account>>;

    fn find_account_by_email(&self, email: String) -> BoxFuture<'_, StoreResult<Account>>;

    fn create_account(&self, account: NewAccount) -> BoxFuture<'_, StoreResult<Account>>;
}

pub trait OrderStore: Send + Sync {
    /// Writes the order row and every line item in a single transaction and
    /// returns the new order id. When `decrement_stock` is set the matching
    /// product stock is reduced inside the same transaction. Either everything
    /// commits or nothing does.
    fn insert_order(&self, order: NewOrder, decrement_stock: bool) -> BoxFuture<'_, StoreResult<i32>>;

    /// The order with its line items, product summaries and owner summary.
    fn find_order(&self, id: i32) -> BoxFuture<'_, StoreResult<Order>>;

    /// Newest first, ties broken by id.
    fn list_orders_by_user(&self, user_id: i32) -> BoxFuture<'_, StoreResult<Vec<Order>>>;

    /// Flips the paid flag on an order owned by `user_id`.
    fn mark_paid(
        &self,
        id: i32,
        user_id: i32,
        result: PaymentResult,
        paid_at: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<()>>;
}

pub trait ActivityStore: Send + Sync {
    fn record_activity(&self, activity: NewActivity) -> BoxFuture<'_, StoreResult<Activity>>;

    fn open_session(&self, session: NewSession) -> BoxFuture<'_, StoreResult<Session>>;

    /// Ends every active session of `user_id` carrying `session_token` and
    /// returns how many were closed.
    fn close_session(
        &self,
        user_id: i32,
        session_token: String,
        logout_time: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<usize>>;
}

pub trait HealthCheck: Send + Sync {
    fn ping(&self) -> BoxFuture<'_, StoreResult<()>>;
}

/// The set of store handles shared through the application state.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub orders: Arc<dyn OrderStore>,
    pub activities: Arc<dyn ActivityStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Stores {
    /// Uses one backend for every store.
    pub fn single<S>(store: S) -> Self
    where
        S: CatalogStore + AccountStore + OrderStore + ActivityStore + HealthCheck + 'static,
    {
        let store = Arc::new(store);
        Self {
            catalog: store.clone(),
            accounts: store.clone(),
            orders: store.clone(),
            activities: store.clone(),
            health: store,
        }
    }
}
