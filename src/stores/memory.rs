//! In-process store backed by `BTreeMap`s.
//!
//! Order placement stages every row first and publishes them under a single
//! write lock, so a failure at any step leaves the tables untouched. The
//! [`Faults`] knobs let tests break a transaction half way through.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use uuid::Uuid;

use super::{
    AccountStore, ActivityStore, CatalogStore, HealthCheck, OrderStore, StoreError, StoreResult,
};
use crate::{
    domain::{
        Account, Activity, Category, NewAccount, NewActivity, NewOrder, NewProduct, NewSession,
        Order, OrderItem, PaymentMethod, PaymentResult, Product, ProductSummary, Session,
        ShippingAddress, UserSummary,
    },
    money::Money,
};

/// Failures to inject into the next operations.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    /// Abort the order transaction while writing the line item at this index.
    pub fail_on_line_item: Option<usize>,
    /// Fail every order read.
    pub fail_order_reads: bool,
    /// Wait this long before committing an order.
    pub commit_delay: Option<Duration>,
}

struct OrderRow {
    id: i32,
    user_id: i32,
    shipping_address: ShippingAddress,
    payment_method: PaymentMethod,
    payment_result: Option<PaymentResult>,
    total_amount: Money,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    quantity: i32,
    price: Money,
}

#[derive(Default)]
struct Tables {
    products: BTreeMap<i32, Product>,
    accounts: BTreeMap<i32, Account>,
    orders: BTreeMap<i32, OrderRow>,
    order_items: BTreeMap<i32, OrderItemRow>,
    activities: Vec<Activity>,
    sessions: BTreeMap<i32, Session>,
}

fn next_id<V>(table: &BTreeMap<i32, V>) -> i32 {
    table.last_key_value().map(|(id, _)| id + 1).unwrap_or(1)
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<RwLock<Faults>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with one product per category.
    pub fn with_demo_catalog() -> Self {
        let store = Self::new();
        let demo = [
            ("Ryzen 7 7800X3D", "32999.00", Category::Processors),
            ("GeForce RTX 4070", "54999.00", Category::Graphics),
            ("32GB DDR5-6000 Kit", "9499.00", Category::Memory),
            ("240mm AIO Liquid Cooler", "7999.00", Category::Cooling),
            ("Mechanical Keyboard", "4499.00", Category::Peripherals),
        ];
        for (name, price, category) in demo {
            let price = price.parse().unwrap_or(Money::ZERO);
            store.insert_product(NewProduct {
                name: name.to_string(),
                price,
                description: format!("{name} from the TechStore demo catalog"),
                category,
                image: String::new(),
                image_alt: name.to_string(),
                stock: 25,
            });
        }
        store
    }

    pub fn inject(&self, faults: Faults) {
        if let Ok(mut current) = self.faults.write() {
            *current = faults;
        }
    }

    pub fn clear_faults(&self) {
        self.inject(Faults::default());
    }

    pub fn order_count(&self) -> usize {
        self.tables.read().map(|t| t.orders.len()).unwrap_or(0)
    }

    pub fn order_item_count(&self) -> usize {
        self.tables.read().map(|t| t.order_items.len()).unwrap_or(0)
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.tables
            .read()
            .map(|t| t.activities.clone())
            .unwrap_or_default()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.tables
            .read()
            .map(|t| t.sessions.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Emulates `ON DELETE CASCADE`: removes the order and its line items.
    pub fn delete_order(&self, id: i32) -> bool {
        let Ok(mut tables) = self.tables.write() else {
            return false;
        };
        if tables.orders.remove(&id).is_none() {
            return false;
        }
        tables.order_items.retain(|_, item| item.order_id != id);
        true
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend(anyhow!("memory store lock poisoned")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend(anyhow!("memory store lock poisoned")))
    }

    fn faults(&self) -> Faults {
        self.faults.read().map(|f| f.clone()).unwrap_or_default()
    }

    fn insert_product(&self, product: NewProduct) -> Product {
        let mut tables = match self.tables.write() {
            Ok(tables) => tables,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Utc::now();
        let product = Product {
            id: next_id(&tables.products),
            name: product.name,
            price: product.price,
            description: product.description,
            category: product.category,
            image: product.image,
            image_alt: product.image_alt,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        product
    }

    fn commit_order(
        &self,
        order: NewOrder,
        decrement_stock: bool,
        faults: &Faults,
    ) -> StoreResult<i32> {
        let mut tables = self.write()?;

        if !tables.accounts.contains_key(&order.user_id) {
            return Err(anyhow!("orders.user_id {} references a missing user", order.user_id).into());
        }

        let order_id = next_id(&tables.orders);
        let mut item_id = next_id(&tables.order_items);
        let mut items = Vec::with_capacity(order.items.len());
        let mut stock: HashMap<i32, i32> = HashMap::new();

        for (index, item) in order.items.iter().enumerate() {
            if faults.fail_on_line_item == Some(index) {
                return Err(anyhow!("injected failure writing line item {index}").into());
            }
            if item.quantity < 1 {
                return Err(anyhow!("order_items.quantity check violated: {}", item.quantity).into());
            }
            let Some(product) = tables.products.get(&item.product_id) else {
                return Err(anyhow!(
                    "order_items.product_id {} references a missing product",
                    item.product_id
                )
                .into());
            };
            if decrement_stock {
                let remaining = stock.entry(item.product_id).or_insert(product.stock);
                if *remaining < item.quantity {
                    return Err(StoreError::InsufficientStock {
                        product_id: item.product_id,
                    });
                }
                *remaining -= item.quantity;
            }
            items.push(OrderItemRow {
                id: item_id,
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            });
            item_id += 1;
        }

        // Everything validated: publish all rows at once.
        let now = Utc::now();
        tables.orders.insert(
            order_id,
            OrderRow {
                id: order_id,
                user_id: order.user_id,
                shipping_address: order.shipping_address,
                payment_method: order.payment_method,
                payment_result: None,
                total_amount: order.total_amount,
                is_paid: false,
                paid_at: None,
                is_delivered: false,
                delivered_at: None,
                created_at: now,
                updated_at: now,
            },
        );
        for item in items {
            tables.order_items.insert(item.id, item);
        }
        for (product_id, remaining) in stock {
            if let Some(product) = tables.products.get_mut(&product_id) {
                product.stock = remaining;
                product.updated_at = now;
            }
        }

        Ok(order_id)
    }

    fn assemble(tables: &Tables, row: &OrderRow, with_user: bool) -> Order {
        let order_items = tables
            .order_items
            .values()
            .filter(|item| item.order_id == row.id)
            .map(|item| OrderItem {
                id: item.id,
                order_id: item.order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                product: tables.products.get(&item.product_id).map(ProductSummary::from),
            })
            .collect();

        Order {
            id: row.id,
            user_id: row.user_id,
            order_items,
            shipping_address: row.shipping_address.clone(),
            payment_method: row.payment_method,
            payment_result: row.payment_result.clone(),
            total_amount: row.total_amount,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            is_delivered: row.is_delivered,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user: with_user
                .then(|| tables.accounts.get(&row.user_id).map(UserSummary::from))
                .flatten(),
        }
    }
}

impl CatalogStore for MemoryStore {
    fn find_product(&self, id: i32) -> BoxFuture<'_, StoreResult<Product>> {
        Box::pin(async move { self.read()?.products.get(&id).cloned().ok_or(StoreError::NotFound) })
    }

    fn find_products(&self, ids: Vec<i32>) -> BoxFuture<'_, StoreResult<Vec<Product>>> {
        Box::pin(async move {
            let tables = self.read()?;
            Ok(tables
                .products
                .values()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect())
        })
    }

    fn list_products(&self, category: Option<Category>) -> BoxFuture<'_, StoreResult<Vec<Product>>> {
        Box::pin(async move {
            let tables = self.read()?;
            Ok(tables
                .products
                .values()
                .filter(|p| category.is_none_or(|c| p.category == c))
                .cloned()
                .collect())
        })
    }

    fn create_product(&self, product: NewProduct) -> BoxFuture<'_, StoreResult<Product>> {
        Box::pin(async move { Ok(self.insert_product(product)) })
    }
}

impl AccountStore for MemoryStore {
    fn find_account(&self, id: i32) -> BoxFuture<'_, StoreResult<Account>> {
        Box::pin(async move { self.read()?.accounts.get(&id).cloned().ok_or(StoreError::NotFound) })
    }

    fn find_account_by_email(&self, email: String) -> BoxFuture<'_, StoreResult<Account>> {
        Box::pin(async move {
            self.read()?
                .accounts
                .values()
                .find(|a| a.email == email)
                .cloned()
                .ok_or(StoreError::NotFound)
        })
    }

    fn create_account(&self, account: NewAccount) -> BoxFuture<'_, StoreResult<Account>> {
        Box::pin(async move {
            let mut tables = self.write()?;
            if tables.accounts.values().any(|a| a.email == account.email) {
                return Err(StoreError::DuplicateEmail(account.email));
            }
            let now = Utc::now();
            let account = Account {
                id: next_id(&tables.accounts),
                name: account.name,
                email: account.email,
                password_hash: account.password_hash,
                created_at: now,
                updated_at: now,
            };
            tables.accounts.insert(account.id, account.clone());
            Ok(account)
        })
    }
}

impl OrderStore for MemoryStore {
    fn insert_order(&self, order: NewOrder, decrement_stock: bool) -> BoxFuture<'_, StoreResult<i32>> {
        Box::pin(async move {
            let faults = self.faults();
            if let Some(delay) = faults.commit_delay {
                tokio::time::sleep(delay).await;
            }
            self.commit_order(order, decrement_stock, &faults)
        })
    }

    fn find_order(&self, id: i32) -> BoxFuture<'_, StoreResult<Order>> {
        Box::pin(async move {
            if self.faults().fail_order_reads {
                return Err(anyhow!("injected failure reading order {id}").into());
            }
            let tables = self.read()?;
            let row = tables.orders.get(&id).ok_or(StoreError::NotFound)?;
            Ok(Self::assemble(&tables, row, true))
        })
    }

    fn list_orders_by_user(&self, user_id: i32) -> BoxFuture<'_, StoreResult<Vec<Order>>> {
        Box::pin(async move {
            if self.faults().fail_order_reads {
                return Err(anyhow!("injected failure listing orders of user {user_id}").into());
            }
            let tables = self.read()?;
            let mut rows: Vec<&OrderRow> = tables
                .orders
                .values()
                .filter(|row| row.user_id == user_id)
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(rows
                .into_iter()
                .map(|row| Self::assemble(&tables, row, false))
                .collect())
        })
    }

    fn mark_paid(
        &self,
        id: i32,
        user_id: i32,
        result: PaymentResult,
        paid_at: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let mut tables = self.write()?;
            let row = tables
                .orders
                .get_mut(&id)
                .filter(|row| row.user_id == user_id)
                .ok_or(StoreError::NotFound)?;
            row.is_paid = true;
            row.paid_at = Some(paid_at);
            row.payment_result = Some(result);
            row.updated_at = paid_at;
            Ok(())
        })
    }
}

impl ActivityStore for MemoryStore {
    fn record_activity(&self, activity: NewActivity) -> BoxFuture<'_, StoreResult<Activity>> {
        Box::pin(async move {
            let activity = Activity {
                id: Uuid::new_v4(),
                user_id: activity.user_id,
                visitor_id: activity.visitor_id,
                activity_type: activity.activity_type.to_string(),
                activity_data: activity.activity_data,
                page_url: activity.page_url,
                ip_address: activity.ip_address,
                created_at: Utc::now(),
            };
            self.write()?.activities.push(activity.clone());
            Ok(activity)
        })
    }

    fn open_session(&self, session: NewSession) -> BoxFuture<'_, StoreResult<Session>> {
        Box::pin(async move {
            let mut tables = self.write()?;
            if !tables.accounts.contains_key(&session.user_id) {
                return Err(anyhow!("user {} does not exist", session.user_id).into());
            }
            let session = Session {
                id: next_id(&tables.sessions),
                user_id: session.user_id,
                session_token: session.session_token,
                ip_address: session.ip_address,
                user_agent: session.user_agent,
                login_time: Utc::now(),
                logout_time: None,
                is_active: true,
            };
            tables.sessions.insert(session.id, session.clone());
            Ok(session)
        })
    }

    fn close_session(
        &self,
        user_id: i32,
        session_token: String,
        logout_time: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<usize>> {
        Box::pin(async move {
            let mut tables = self.write()?;
            let mut closed = 0;
            for session in tables.sessions.values_mut().filter(|s| {
                s.is_active && s.user_id == user_id && s.session_token == session_token
            }) {
                session.is_active = false;
                session.logout_time = Some(logout_time);
                closed += 1;
            }
            Ok(closed)
        })
    }
}

impl HealthCheck for MemoryStore {
    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move { self.read().map(|_| ()) })
    }
}
