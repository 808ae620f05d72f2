use std::collections::HashMap;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use diesel::{
    ExpressionMethods, QueryDsl, SelectableHelper,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{AsyncConnection, RunQueryDsl};
use futures::future::BoxFuture;
use uuid::Uuid;

use super::{
    AccountStore, ActivityStore, CatalogStore, HealthCheck, OrderStore, StoreError, StoreResult,
};
use crate::{
    db::DbPool,
    domain::{
        Account, Activity, Category, NewAccount, NewActivity, NewOrder, NewProduct, NewSession,
        Order, OrderItem, PaymentResult, Product, ProductSummary, Session, UserSummary,
    },
    models::{
        ActivityEntity, CreateActivityEntity, CreateOrderEntity, CreateOrderItemEntity,
        CreateProductEntity, CreateSessionEntity, CreateUserEntity, OrderEntity, OrderItemEntity,
        ProductEntity, SessionEntity, UserEntity,
    },
    money::Money,
    schema::{order_items, orders, products, user_activities, user_sessions, users},
};

/// Postgres-backed implementation of every store, sharing one bb8 pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TryFrom<ProductEntity> for Product {
    type Error = anyhow::Error;

    fn try_from(entity: ProductEntity) -> Result<Self, Self::Error> {
        Ok(Product {
            price: Money::try_from_decimal(&entity.price)
                .with_context(|| format!("Invalid price on product #{}", entity.id))?,
            category: entity.category.parse().map_err(|e: String| anyhow!(e))?,
            id: entity.id,
            name: entity.name,
            description: entity.description,
            image: entity.image,
            image_alt: entity.image_alt,
            stock: entity.stock,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

impl From<UserEntity> for Account {
    fn from(entity: UserEntity) -> Self {
        Account {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            password_hash: entity.password_hash,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<ActivityEntity> for Activity {
    fn from(entity: ActivityEntity) -> Self {
        Activity {
            id: entity.id,
            user_id: entity.user_id,
            visitor_id: entity.visitor_id,
            activity_type: entity.activity_type,
            activity_data: entity.activity_data,
            page_url: entity.page_url,
            ip_address: entity.ip_address,
            created_at: entity.created_at,
        }
    }
}

impl From<SessionEntity> for Session {
    fn from(entity: SessionEntity) -> Self {
        Session {
            id: entity.id,
            user_id: entity.user_id,
            session_token: entity.session_token,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
            login_time: entity.login_time,
            logout_time: entity.logout_time,
            is_active: entity.is_active,
        }
    }
}

fn order_item_from(item: OrderItemEntity, product: ProductEntity) -> anyhow::Result<OrderItem> {
    let product = Product::try_from(product)?;
    Ok(OrderItem {
        price: Money::try_from_decimal(&item.price)
            .with_context(|| format!("Invalid price on order item #{}", item.id))?,
        id: item.id,
        order_id: item.order_id,
        product_id: item.product_id,
        quantity: item.quantity,
        product: Some(ProductSummary::from(&product)),
    })
}

fn order_from(
    order: OrderEntity,
    order_items: Vec<OrderItem>,
    user: Option<UserSummary>,
) -> anyhow::Result<Order> {
    let payment_result: Option<PaymentResult> = order
        .payment_result
        .map(serde_json::from_value::<PaymentResult>)
        .transpose()
        .with_context(|| format!("Invalid payment result on order #{}", order.id))?;

    Ok(Order {
        id: order.id,
        user_id: order.user_id,
        order_items,
        shipping_address: serde_json::from_value(order.shipping_address)
            .with_context(|| format!("Invalid shipping address on order #{}", order.id))?,
        payment_method: order
            .payment_method
            .parse()
            .map_err(|e: String| anyhow!(e))?,
        payment_result,
        total_amount: Money::try_from_decimal(&order.total_amount)
            .with_context(|| format!("Invalid total on order #{}", order.id))?,
        is_paid: order.is_paid,
        paid_at: order.paid_at,
        is_delivered: order.is_delivered,
        delivered_at: order.delivered_at,
        created_at: order.created_at,
        updated_at: order.updated_at,
        user,
    })
}

impl CatalogStore for PgStore {
    fn find_product(&self, id: i32) -> BoxFuture<'_, StoreResult<Product>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let product: ProductEntity = products::table
                .find(id)
                .select(ProductEntity::as_select())
                .get_result(conn)
                .await?;

            Ok(Product::try_from(product)?)
        })
    }

    fn find_products(&self, ids: Vec<i32>) -> BoxFuture<'_, StoreResult<Vec<Product>>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let products: Vec<ProductEntity> = products::table
                .filter(products::id.eq_any(&ids))
                .select(ProductEntity::as_select())
                .get_results(conn)
                .await
                .context("Failed to get products")?;

            Ok(products
                .into_iter()
                .map(Product::try_from)
                .collect::<anyhow::Result<_>>()?)
        })
    }

    fn list_products(&self, category: Option<Category>) -> BoxFuture<'_, StoreResult<Vec<Product>>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let mut query = products::table
                .select(ProductEntity::as_select())
                .order_by(products::id.asc())
                .into_boxed();
            if let Some(category) = category {
                query = query.filter(products::category.eq(category.as_str()));
            }

            let products: Vec<ProductEntity> = query
                .get_results(conn)
                .await
                .context("Failed to list products")?;

            Ok(products
                .into_iter()
                .map(Product::try_from)
                .collect::<anyhow::Result<_>>()?)
        })
    }

    fn create_product(&self, product: NewProduct) -> BoxFuture<'_, StoreResult<Product>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let product: ProductEntity = diesel::insert_into(products::table)
                .values(CreateProductEntity {
                    name: product.name,
                    price: product.price.to_decimal(),
                    description: product.description,
                    category: product.category.to_string(),
                    image: product.image,
                    image_alt: product.image_alt,
                    stock: product.stock,
                })
                .returning(ProductEntity::as_returning())
                .get_result(conn)
                .await
                .context("Failed to create product")?;

            Ok(Product::try_from(product)?)
        })
    }
}

impl AccountStore for PgStore {
    fn find_account(&self, id: i32) -> BoxFuture<'_, StoreResult<Account>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let user: UserEntity = users::table
                .find(id)
                .select(UserEntity::as_select())
                .get_result(conn)
                .await?;

            Ok(user.into())
        })
    }

    fn find_account_by_email(&self, email: String) -> BoxFuture<'_, StoreResult<Account>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let user: UserEntity = users::table
                .filter(users::email.eq(&email))
                .select(UserEntity::as_select())
                .get_result(conn)
                .await?;

            Ok(user.into())
        })
    }

    fn create_account(&self, account: NewAccount) -> BoxFuture<'_, StoreResult<Account>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let email = account.email.clone();
            let user = diesel::insert_into(users::table)
                .values(CreateUserEntity {
                    name: account.name,
                    email: account.email,
                    password_hash: account.password_hash,
                })
                .returning(UserEntity::as_returning())
                .get_result(conn)
                .await;

            match user {
                Ok(user) => Ok(user.into()),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    Err(StoreError::DuplicateEmail(email))
                }
                Err(err) => Err(anyhow::Error::from(err)
                    .context("Failed to create user")
                    .into()),
            }
        })
    }
}

impl OrderStore for PgStore {
    fn insert_order(&self, order: NewOrder, decrement_stock: bool) -> BoxFuture<'_, StoreResult<i32>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let shipping_address = serde_json::to_value(&order.shipping_address)
                .context("Failed to encode shipping address")?;

            conn.transaction(move |conn| {
                Box::pin(async move {
                    let created: OrderEntity = diesel::insert_into(orders::table)
                        .values(CreateOrderEntity {
                            user_id: order.user_id,
                            total_amount: order.total_amount.to_decimal(),
                            shipping_address,
                            payment_method: order.payment_method.to_string(),
                        })
                        .returning(OrderEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to create order")?;

                    // A single multi-row insert keeps the cart order in the ids.
                    let items: Vec<CreateOrderItemEntity> = order
                        .items
                        .iter()
                        .map(|item| CreateOrderItemEntity {
                            order_id: created.id,
                            product_id: item.product_id,
                            quantity: item.quantity,
                            price: item.price.to_decimal(),
                        })
                        .collect();

                    diesel::insert_into(order_items::table)
                        .values(items)
                        .execute(conn)
                        .await
                        .context("Failed to create order items")?;

                    if decrement_stock {
                        for item in &order.items {
                            let reserved = diesel::update(products::table.find(item.product_id))
                                .filter(products::stock.ge(item.quantity))
                                .set((
                                    products::stock.eq(products::stock - item.quantity),
                                    products::updated_at.eq(diesel::dsl::now),
                                ))
                                .execute(conn)
                                .await
                                .context("Failed to reserve stock")?;

                            if reserved == 0 {
                                return Err(StoreError::InsufficientStock {
                                    product_id: item.product_id,
                                });
                            }
                        }
                    }

                    Ok::<i32, StoreError>(created.id)
                })
            })
            .await
        })
    }

    fn find_order(&self, id: i32) -> BoxFuture<'_, StoreResult<Order>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let order: OrderEntity = orders::table
                .find(id)
                .select(OrderEntity::as_select())
                .get_result(conn)
                .await?;

            let rows: Vec<(OrderItemEntity, ProductEntity)> = order_items::table
                .inner_join(products::table)
                .filter(order_items::order_id.eq(order.id))
                .order_by(order_items::id.asc())
                .select((OrderItemEntity::as_select(), ProductEntity::as_select()))
                .get_results(conn)
                .await
                .context("Failed to get order items")?;

            let user: UserEntity = users::table
                .find(order.user_id)
                .select(UserEntity::as_select())
                .get_result(conn)
                .await
                .context("Failed to get order owner")?;

            let order_items = rows
                .into_iter()
                .map(|(item, product)| order_item_from(item, product))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let user = UserSummary {
                name: user.name,
                email: user.email,
            };

            Ok(order_from(order, order_items, Some(user))?)
        })
    }

    fn list_orders_by_user(&self, user_id: i32) -> BoxFuture<'_, StoreResult<Vec<Order>>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let orders: Vec<OrderEntity> = orders::table
                .filter(orders::user_id.eq(user_id))
                .order_by((orders::created_at.desc(), orders::id.desc()))
                .select(OrderEntity::as_select())
                .get_results(conn)
                .await
                .context("Failed to get my orders")?;

            let order_ids: Vec<i32> = orders.iter().map(|order| order.id).collect();
            let rows: Vec<(OrderItemEntity, ProductEntity)> = order_items::table
                .inner_join(products::table)
                .filter(order_items::order_id.eq_any(&order_ids))
                .order_by(order_items::id.asc())
                .select((OrderItemEntity::as_select(), ProductEntity::as_select()))
                .get_results(conn)
                .await
                .context("Failed to get order items")?;

            let mut group: HashMap<i32, Vec<OrderItem>> = HashMap::new();
            for (item, product) in rows {
                let item = order_item_from(item, product)?;
                group.entry(item.order_id).or_default().push(item);
            }

            Ok(orders
                .into_iter()
                .map(|order| {
                    let order_items = group.remove(&order.id).unwrap_or_default();
                    order_from(order, order_items, None)
                })
                .collect::<anyhow::Result<_>>()?)
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
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let payment_result =
                serde_json::to_value(&result).context("Failed to encode payment result")?;

            let updated = diesel::update(
                orders::table
                    .find(id)
                    .filter(orders::user_id.eq(user_id)),
            )
            .set((
                orders::is_paid.eq(true),
                orders::paid_at.eq(Some(paid_at)),
                orders::payment_result.eq(Some(payment_result)),
                orders::updated_at.eq(paid_at),
            ))
            .execute(conn)
            .await
            .context("Failed to update order payment")?;

            if updated == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }
}

impl ActivityStore for PgStore {
    fn record_activity(&self, activity: NewActivity) -> BoxFuture<'_, StoreResult<Activity>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let activity: ActivityEntity = diesel::insert_into(user_activities::table)
                .values(CreateActivityEntity {
                    id: Uuid::new_v4(),
                    user_id: activity.user_id,
                    visitor_id: activity.visitor_id,
                    activity_type: activity.activity_type.to_string(),
                    activity_data: activity.activity_data,
                    page_url: activity.page_url,
                    ip_address: activity.ip_address,
                })
                .returning(ActivityEntity::as_returning())
                .get_result(conn)
                .await
                .context("Failed to record activity")?;

            Ok(activity.into())
        })
    }

    fn open_session(&self, session: NewSession) -> BoxFuture<'_, StoreResult<Session>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let session: SessionEntity = diesel::insert_into(user_sessions::table)
                .values(CreateSessionEntity {
                    user_id: session.user_id,
                    session_token: session.session_token,
                    ip_address: session.ip_address,
                    user_agent: session.user_agent,
                })
                .returning(SessionEntity::as_returning())
                .get_result(conn)
                .await
                .context("Failed to open session")?;

            Ok(session.into())
        })
    }

    fn close_session(
        &self,
        user_id: i32,
        session_token: String,
        logout_time: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<usize>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let closed = diesel::update(
                user_sessions::table
                    .filter(user_sessions::user_id.eq(user_id))
                    .filter(user_sessions::session_token.eq(session_token))
                    .filter(user_sessions::is_active.eq(true)),
            )
            .set((
                user_sessions::logout_time.eq(Some(logout_time)),
                user_sessions::is_active.eq(false),
            ))
            .execute(conn)
            .await
            .context("Failed to close session")?;

            Ok(closed)
        })
    }
}

impl HealthCheck for PgStore {
    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            diesel::sql_query("SELECT 1")
                .execute(conn)
                .await
                .context("Database did not answer")?;
            Ok(())
        })
    }
}
