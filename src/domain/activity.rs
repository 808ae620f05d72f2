use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Login,
    Logout,
    ProductView,
    AddToCart,
    RemoveFromCart,
    CheckoutStart,
    CheckoutComplete,
    PageVisit,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Login => "login",
            ActivityType::Logout => "logout",
            ActivityType::ProductView => "product_view",
            ActivityType::AddToCart => "add_to_cart",
            ActivityType::RemoveFromCart => "remove_from_cart",
            ActivityType::CheckoutStart => "checkout_start",
            ActivityType::CheckoutComplete => "checkout_complete",
            ActivityType::PageVisit => "page_visit",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Option<i32>,
    pub visitor_id: Option<String>,
    pub activity_type: String,
    pub activity_data: Value,
    pub page_url: String,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewActivity {
    pub user_id: Option<i32>,
    pub visitor_id: Option<String>,
    pub activity_type: ActivityType,
    pub activity_data: Value,
    pub page_url: String,
    pub ip_address: Option<String>,
}

/// A storefront sign-in, closed again by the matching logout.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub id: i32,
    pub user_id: i32,
    pub session_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[derive(Clone, Debug)]
pub struct NewSession {
    pub user_id: i32,
    pub session_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
