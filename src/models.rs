use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{Identifiable, Insertable, Queryable},
};
use serde_json::Value;
use uuid::Uuid;

// Users

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserEntity {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct CreateUserEntity {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// Products

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub image_alt: String,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::products)]
pub struct CreateProductEntity {
    pub name: String,
    pub price: BigDecimal,
    pub description: String,
    pub category: String,
    pub image: String,
    pub image_alt: String,
    pub stock: i32,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub user_id: i32,
    pub total_amount: BigDecimal,
    pub shipping_address: Value,
    pub payment_method: String,
    pub payment_result: Option<Value>,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub user_id: i32,
    pub total_amount: BigDecimal,
    pub shipping_address: Value,
    pub payment_method: String,
}

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderItemEntity {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
}

// Activities

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::user_activities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ActivityEntity {
    pub id: Uuid,
    pub user_id: Option<i32>,
    pub visitor_id: Option<String>,
    pub activity_type: String,
    pub activity_data: Value,
    pub page_url: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::user_activities)]
pub struct CreateActivityEntity {
    pub id: Uuid,
    pub user_id: Option<i32>,
    pub visitor_id: Option<String>,
    pub activity_type: String,
    pub activity_data: Value,
    pub page_url: String,
    pub ip_address: Option<String>,
}

// Sessions

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::user_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SessionEntity {
    pub id: i32,
    pub user_id: i32,
    pub session_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::user_sessions)]
pub struct CreateSessionEntity {
    pub user_id: i32,
    pub session_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
