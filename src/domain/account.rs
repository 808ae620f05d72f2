use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A registered user together with the stored password hash.
///
/// Never serialised directly; use [`UserSummary`] or a route-level response.
#[derive(Clone, Debug)]
pub struct Account {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct UserSummary {
    pub name: String,
    pub email: String,
}

impl From<&Account> for UserSummary {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}
