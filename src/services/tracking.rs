use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    app_error::AppError,
    domain::{Activity, ActivityType, NewActivity, NewSession},
    middleware::RequestMeta,
    stores::{AccountStore, ActivityStore, StoreError},
};

/// Body shared by every tracking endpoint; each event reads the fields it needs.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TrackingInput {
    pub user_id: Option<i32>,
    pub visitor_id: Option<String>,
    pub product_id: Option<i32>,
    pub quantity: Option<i64>,
    pub view_duration: Option<i64>,
    #[schema(value_type = Option<Object>)]
    pub cart_items: Option<Value>,
    pub order_id: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub total_amount: Option<Value>,
    pub payment_method: Option<String>,
    pub page_url: Option<String>,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
    /// Opens a session on login and closes it on logout.
    pub session_token: Option<String>,
}

#[derive(Clone)]
pub struct TrackingService {
    activities: Arc<dyn ActivityStore>,
    accounts: Arc<dyn AccountStore>,
}

impl TrackingService {
    pub fn new(activities: Arc<dyn ActivityStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            activities,
            accounts,
        }
    }

    /// Appends one activity. `caller` is the user behind a valid bearer token, if any.
    pub async fn record(
        &self,
        kind: ActivityType,
        input: TrackingInput,
        meta: RequestMeta,
        caller: Option<i32>,
    ) -> Result<Activity, AppError> {
        let activity_data = activity_data(kind, &input, &meta)?;
        let user_id = match caller {
            Some(id) => Some(id),
            None => self.known_user(input.user_id).await?,
        };
        let session_token = input.session_token.clone().filter(|token| !token.is_empty());
        if let (Some(user_id), Some(session_token)) = (user_id, session_token) {
            self.track_session(kind, user_id, session_token, &meta).await?;
        }

        let page_url = input
            .page_url
            .filter(|url| kind == ActivityType::PageVisit && !url.is_empty())
            .or(meta.referer)
            .unwrap_or_else(|| "/".to_string());

        let activity = self
            .activities
            .record_activity(NewActivity {
                user_id,
                visitor_id: input.visitor_id.filter(|v| !v.is_empty()),
                activity_type: kind,
                activity_data,
                page_url,
                ip_address: meta.ip_address,
            })
            .await?;
        debug!("Tracked {kind} for user {user_id:?}");
        Ok(activity)
    }

    /// Login opens a session for the token and logout closes it. Sessions
    /// need a known user, so anonymous events skip this step.
    async fn track_session(
        &self,
        kind: ActivityType,
        user_id: i32,
        session_token: String,
        meta: &RequestMeta,
    ) -> Result<(), AppError> {
        match kind {
            ActivityType::Login => {
                let session = self
                    .activities
                    .open_session(NewSession {
                        user_id,
                        session_token,
                        ip_address: meta.ip_address.clone(),
                        user_agent: meta.user_agent.clone(),
                    })
                    .await?;
                debug!("Opened session #{} for user {user_id}", session.id);
            }
            ActivityType::Logout => {
                let closed = self
                    .activities
                    .close_session(user_id, session_token, Utc::now())
                    .await?;
                debug!("Closed {closed} session(s) for user {user_id}");
            }
            _ => {}
        }
        Ok(())
    }

    /// Client-supplied ids are kept only when the account exists.
    async fn known_user(&self, user_id: Option<i32>) -> Result<Option<i32>, AppError> {
        let Some(id) = user_id else {
            return Ok(None);
        };
        match self.accounts.find_account(id).await {
            Ok(account) => Ok(Some(account.id)),
            Err(StoreError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn require_product(input: &TrackingInput) -> Result<i32, AppError> {
    input
        .product_id
        .ok_or_else(|| AppError::Validation("product_id is required".into()))
}

fn activity_data(kind: ActivityType, input: &TrackingInput, meta: &RequestMeta) -> Result<Value, AppError> {
    let data = match kind {
        ActivityType::Login | ActivityType::Logout => json!({ "user_agent": meta.user_agent }),
        ActivityType::ProductView => json!({
            "product_id": require_product(input)?,
            "view_duration": input.view_duration.unwrap_or(0),
        }),
        ActivityType::AddToCart => json!({
            "product_id": require_product(input)?,
            "quantity": input.quantity.unwrap_or(1),
        }),
        ActivityType::RemoveFromCart => json!({ "product_id": require_product(input)? }),
        ActivityType::CheckoutStart => {
            let total_items = input
                .cart_items
                .as_ref()
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            json!({ "cart_items": input.cart_items, "total_items": total_items })
        }
        ActivityType::CheckoutComplete => json!({
            "order_id": input.order_id,
            "total_amount": input.total_amount,
            "payment_method": input.payment_method,
        }),
        ActivityType::PageVisit => json!({
            "page_title": input.page_title.clone().unwrap_or_default(),
            "referrer": input.referrer.clone().unwrap_or_default(),
            "user_agent": meta.user_agent,
        }),
    };
    Ok(data)
}
