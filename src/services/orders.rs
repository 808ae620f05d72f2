use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::anyhow;
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    app_error::AppError,
    config::PricingPolicy,
    domain::{NewOrder, NewOrderItem, Order, PaymentResult},
    money::Money,
    stores::{AccountStore, CatalogStore, OrderStore, StoreError, Stores},
    validation::{self, OrderInput},
};

#[derive(Clone, Debug)]
pub struct OrderSettings {
    pub pricing: PricingPolicy,
    pub decrement_stock: bool,
    pub transaction_timeout: Duration,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            pricing: PricingPolicy::Client,
            decrement_stock: false,
            transaction_timeout: Duration::from_secs(30),
        }
    }
}

/// Turns a validated cart into a persisted order and guards access to it.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogStore>,
    accounts: Arc<dyn AccountStore>,
    settings: OrderSettings,
}

impl OrderService {
    pub fn new(stores: &Stores, settings: OrderSettings) -> Self {
        Self {
            orders: stores.orders.clone(),
            catalog: stores.catalog.clone(),
            accounts: stores.accounts.clone(),
            settings,
        }
    }

    /// Places an order for `user_id`.
    ///
    /// Nothing is written unless validation passes, and the order row and all
    /// of its items commit together or not at all.
    pub async fn place_order(&self, user_id: i32, input: OrderInput) -> Result<Order, AppError> {
        let validated = validation::validate_order(&input)?;

        match self.accounts.find_account(user_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound) => {
                return Err(AppError::Authentication("Not authorized, user not found".into()));
            }
            Err(err) => return Err(err.into()),
        }

        let mut ids: Vec<i32> = validated.lines.iter().map(|line| line.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let catalog: HashMap<i32, Money> = self
            .catalog
            .find_products(ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product.price))
            .collect();

        let mut items = Vec::with_capacity(validated.lines.len());
        for line in &validated.lines {
            let catalog_price = catalog.get(&line.product_id).copied().ok_or_else(|| {
                AppError::Validation(format!("Product {} not found", line.product_id))
            })?;
            let price = match self.settings.pricing {
                PricingPolicy::Catalog => catalog_price,
                PricingPolicy::Client => line.price.ok_or_else(|| {
                    AppError::Validation(format!("Price is required for product {}", line.product_id))
                })?,
            };
            items.push(NewOrderItem {
                product_id: line.product_id,
                quantity: line.quantity,
                price,
            });
        }

        let total_amount = Money::line_total(items.iter().map(|item| (item.quantity, item.price)))
            .filter(|total| *total <= validation::MAX_ORDER_TOTAL)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Order total cannot exceed {}",
                    validation::MAX_ORDER_TOTAL
                ))
            })?;
        if let Some(claimed) = validated.claimed_total {
            if claimed != total_amount {
                return Err(AppError::Validation(format!(
                    "Total price {claimed} does not match the order total {total_amount}"
                )));
            }
        }

        let line_count = items.len();
        let new_order = NewOrder {
            user_id,
            shipping_address: validated.shipping_address,
            payment_method: validated.payment_method,
            total_amount,
            items,
        };

        let insert = self.orders.insert_order(new_order, self.settings.decrement_stock);
        let order_id = match tokio::time::timeout(self.settings.transaction_timeout, insert).await {
            Ok(Ok(id)) => id,
            Ok(Err(StoreError::InsufficientStock { product_id })) => {
                return Err(AppError::Validation(format!(
                    "Insufficient stock for product {product_id}"
                )));
            }
            Ok(Err(err)) => {
                warn!("Order for user {user_id} rolled back: {err}");
                return Err(AppError::Persistence(err.into()));
            }
            Err(_) => {
                warn!("Order for user {user_id} timed out and was abandoned");
                return Err(AppError::Persistence(anyhow!(
                    "order transaction exceeded {:?}",
                    self.settings.transaction_timeout
                )));
            }
        };
        info!("Placed order #{order_id} for user {user_id}: {line_count} items, total {total_amount}");

        self.orders
            .find_order(order_id)
            .await
            .map_err(|err| AppError::ReadBack {
                order_id,
                source: err.into(),
            })
    }

    /// Fetches an order for its owner.
    pub async fn get_order(&self, order_id: i32, requester_id: i32) -> Result<Order, AppError> {
        let order = match self.orders.find_order(order_id).await {
            Ok(order) => order,
            Err(StoreError::NotFound) => return Err(AppError::NotFound("Order not found".into())),
            Err(err) => return Err(err.into()),
        };
        if order.user_id != requester_id {
            return Err(AppError::Authorization("Not authorized to access this order".into()));
        }
        Ok(order)
    }

    pub async fn list_orders_for_user(&self, user_id: i32) -> Result<Vec<Order>, AppError> {
        Ok(self.orders.list_orders_by_user(user_id).await?)
    }

    /// Records a completed payment and returns the updated order.
    pub async fn mark_order_paid(
        &self,
        order_id: i32,
        requester_id: i32,
        payment_result: PaymentResult,
    ) -> Result<Order, AppError> {
        self.get_order(order_id, requester_id).await?;

        match self
            .orders
            .mark_paid(order_id, requester_id, payment_result, Utc::now())
            .await
        {
            Ok(()) => {}
            Err(StoreError::NotFound) => return Err(AppError::NotFound("Order not found".into())),
            Err(err) => return Err(err.into()),
        }
        info!("Order #{order_id} marked as paid");

        self.orders
            .find_order(order_id)
            .await
            .map_err(|err| AppError::ReadBack {
                order_id,
                source: err.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        domain::{Category, NewAccount, NewProduct, PaymentMethod},
        stores::memory::{Faults, MemoryStore},
        validation::{AddressInput, OrderItemInput},
    };

    struct Fixture {
        store: MemoryStore,
        service: OrderService,
        user_id: i32,
        other_user_id: i32,
        cpu: i32,
        gpu: i32,
    }

    async fn add_product(store: &MemoryStore, name: &str, price: &str) -> i32 {
        store
            .create_product(NewProduct {
                name: name.into(),
                price: price.parse().unwrap(),
                description: String::new(),
                category: Category::Processors,
                image: String::new(),
                image_alt: name.into(),
                stock: 10,
            })
            .await
            .unwrap()
            .id
    }

    async fn add_user(store: &MemoryStore, email: &str) -> i32 {
        store
            .create_account(NewAccount {
                name: "Test User".into(),
                email: email.into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
            .id
    }

    async fn fixture(settings: OrderSettings) -> Fixture {
        let store = MemoryStore::new();
        let cpu = add_product(&store, "Ryzen 5", "499.00").await;
        let gpu = add_product(&store, "RTX 4060", "1200.00").await;
        let user_id = add_user(&store, "asha@example.com").await;
        let other_user_id = add_user(&store, "ravi@example.com").await;
        let service = OrderService::new(&Stores::single(store.clone()), settings);
        Fixture {
            store,
            service,
            user_id,
            other_user_id,
            cpu,
            gpu,
        }
    }

    fn line(product_id: i32, quantity: i64, price: &str) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
            price: Some(price.parse().unwrap()),
            name: None,
            image: None,
        }
    }

    fn cart(items: Vec<OrderItemInput>) -> OrderInput {
        OrderInput {
            order_items: Some(items),
            shipping_address: Some(AddressInput {
                address: Some("1 Main St".into()),
                city: Some("Pune".into()),
                postal_code: Some("411001".into()),
                country: Some("IN".into()),
            }),
            payment_method: Some("cod".into()),
            total_price: None,
        }
    }

    #[tokio::test]
    async fn places_an_order_with_all_lines_and_the_computed_total() {
        let f = fixture(OrderSettings::default()).await;

        let order = f
            .service
            .place_order(f.user_id, cart(vec![line(f.cpu, 2, "499.00"), line(f.gpu, 1, "1200.00")]))
            .await
            .unwrap();

        assert_eq!(order.user_id, f.user_id);
        assert_eq!(order.total_amount.to_string(), "2198.00");
        assert_eq!(order.payment_method, PaymentMethod::Cod);
        assert!(!order.is_paid && !order.is_delivered);
        assert_eq!(order.order_items.len(), 2);
        assert_eq!(order.items_total(), Some(order.total_amount));
        assert_eq!(order.order_items[0].product.as_ref().unwrap().name, "Ryzen 5");
        assert_eq!(order.user.as_ref().unwrap().email, "asha@example.com");
    }

    #[tokio::test]
    async fn invalid_carts_never_touch_storage() {
        let f = fixture(OrderSettings::default()).await;
        // an unknown user would fail later with 401, so validation has to run first
        let err = f.service.place_order(9999, cart(vec![])).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(ref m) if m == "No order items"));
        assert_eq!(f.store.order_count(), 0);
    }

    #[tokio::test]
    async fn unknown_user_and_unknown_product_are_rejected_before_writing() {
        let f = fixture(OrderSettings::default()).await;

        let err = f
            .service
            .place_order(9999, cart(vec![line(f.cpu, 1, "499.00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));

        let err = f
            .service
            .place_order(f.user_id, cart(vec![line(4242, 1, "10.00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("4242")));
        assert_eq!(f.store.order_count(), 0);
    }

    #[tokio::test]
    async fn a_failing_line_item_rolls_back_the_whole_order() {
        let f = fixture(OrderSettings::default()).await;
        f.store.inject(Faults {
            fail_on_line_item: Some(1),
            ..Faults::default()
        });

        let err = f
            .service
            .place_order(f.user_id, cart(vec![line(f.cpu, 1, "499.00"), line(f.gpu, 1, "1200.00")]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Persistence(_)));
        assert_eq!(f.store.order_count(), 0);
        assert_eq!(f.store.order_item_count(), 0);
    }

    #[tokio::test]
    async fn a_slow_commit_times_out_without_leaving_rows() {
        let f = fixture(OrderSettings {
            transaction_timeout: Duration::from_millis(20),
            ..OrderSettings::default()
        })
        .await;
        f.store.inject(Faults {
            commit_delay: Some(Duration::from_millis(500)),
            ..Faults::default()
        });

        let err = f
            .service
            .place_order(f.user_id, cart(vec![line(f.cpu, 1, "499.00")]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Persistence(_)));
        assert_eq!(f.store.order_count(), 0);
    }

    #[tokio::test]
    async fn a_failed_read_back_reports_the_committed_order_id() {
        let f = fixture(OrderSettings::default()).await;
        f.store.inject(Faults {
            fail_order_reads: true,
            ..Faults::default()
        });

        let err = f
            .service
            .place_order(f.user_id, cart(vec![line(f.cpu, 1, "499.00")]))
            .await
            .unwrap_err();
        let AppError::ReadBack { order_id, .. } = err else {
            panic!("expected a read-back error, got {err:?}");
        };

        f.store.clear_faults();
        assert_eq!(f.store.order_count(), 1);
        let order = f.service.get_order(order_id, f.user_id).await.unwrap();
        assert_eq!(order.order_items.len(), 1);
    }

    #[tokio::test]
    async fn claimed_total_must_match() {
        let f = fixture(OrderSettings::default()).await;
        let mut input = cart(vec![line(f.cpu, 2, "499.00")]);
        input.total_price = Some("999.00".parse().unwrap());

        let err = f.service.place_order(f.user_id, input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("998.00")));

        let mut input = cart(vec![line(f.cpu, 2, "499.00")]);
        input.total_price = Some("998".parse().unwrap());
        assert!(f.service.place_order(f.user_id, input).await.is_ok());
    }

    #[tokio::test]
    async fn totals_too_large_to_store_are_rejected_before_writing() {
        let f = fixture(OrderSettings::default()).await;

        let err = f
            .service
            .place_order(
                f.user_id,
                cart(vec![line(f.cpu, 100, "99999999.99"), line(f.gpu, 100, "99999999.99")]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Order total cannot exceed 9999999999.99"));

        let catalog = fixture(OrderSettings {
            pricing: PricingPolicy::Catalog,
            ..OrderSettings::default()
        })
        .await;
        let pricey = add_product(&catalog.store, "Server rack", "10000000.00").await;
        let lines = (0..10).map(|_| line(pricey, 100, "1.00")).collect();
        let err = catalog.service.place_order(catalog.user_id, cart(lines)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(f.store.order_count(), 0);
        assert_eq!(catalog.store.order_count(), 0);
    }

    #[tokio::test]
    async fn catalog_pricing_ignores_client_prices() {
        let f = fixture(OrderSettings {
            pricing: PricingPolicy::Catalog,
            ..OrderSettings::default()
        })
        .await;

        let order = f
            .service
            .place_order(f.user_id, cart(vec![line(f.gpu, 1, "1.00")]))
            .await
            .unwrap();
        assert_eq!(order.total_amount.to_string(), "1200.00");
    }

    #[tokio::test]
    async fn stock_is_decremented_when_enabled() {
        let f = fixture(OrderSettings {
            decrement_stock: true,
            ..OrderSettings::default()
        })
        .await;

        f.service
            .place_order(f.user_id, cart(vec![line(f.cpu, 4, "499.00")]))
            .await
            .unwrap();
        assert_eq!(f.store.find_product(f.cpu).await.unwrap().stock, 6);

        let err = f
            .service
            .place_order(f.user_id, cart(vec![line(f.gpu, 1, "1200.00"), line(f.cpu, 7, "499.00")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("Insufficient stock")));
        assert_eq!(f.store.find_product(f.gpu).await.unwrap().stock, 10);
        assert_eq!(f.store.order_count(), 1);
    }

    #[tokio::test]
    async fn orders_are_only_visible_to_their_owner() {
        let f = fixture(OrderSettings::default()).await;
        let order = f
            .service
            .place_order(f.user_id, cart(vec![line(f.cpu, 1, "499.00")]))
            .await
            .unwrap();

        let err = f.service.get_order(order.id, f.other_user_id).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        let err = f.service.get_order(order.id + 100, f.user_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let first = f.service.get_order(order.id, f.user_id).await.unwrap();
        let second = f.service.get_order(order.id, f.user_id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_per_user() {
        let f = fixture(OrderSettings::default()).await;
        let first = f
            .service
            .place_order(f.user_id, cart(vec![line(f.cpu, 1, "499.00")]))
            .await
            .unwrap();
        let second = f
            .service
            .place_order(f.user_id, cart(vec![line(f.gpu, 1, "1200.00")]))
            .await
            .unwrap();
        f.service
            .place_order(f.other_user_id, cart(vec![line(f.gpu, 1, "1200.00")]))
            .await
            .unwrap();

        let ids: Vec<i32> = f
            .service
            .list_orders_for_user(f.user_id)
            .await
            .unwrap()
            .iter()
            .map(|order| order.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn paying_sets_the_flag_for_the_owner_only() {
        let f = fixture(OrderSettings::default()).await;
        let order = f
            .service
            .place_order(f.user_id, cart(vec![line(f.cpu, 1, "499.00")]))
            .await
            .unwrap();
        let result = PaymentResult {
            id: Some("PAY-1".into()),
            status: Some("COMPLETED".into()),
            ..PaymentResult::default()
        };

        let err = f
            .service
            .mark_order_paid(order.id, f.other_user_id, result.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let paid = f
            .service
            .mark_order_paid(order.id, f.user_id, result.clone())
            .await
            .unwrap();
        assert!(paid.is_paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.payment_result, Some(result));
        assert_eq!(paid.total_amount, order.total_amount);
    }
}
