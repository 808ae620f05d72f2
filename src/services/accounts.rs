use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    app_error::AppError,
    auth::{self, TokenIssuer},
    domain::{Account, NewAccount},
    stores::{AccountStore, StoreError},
    validation::{self, LoginInput, RegistrationInput},
};

/// Returned by register and login.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthRes {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRes {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for ProfileRes {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            created_at: account.created_at,
        }
    }
}

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountStore>,
    tokens: TokenIssuer,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountStore>, tokens: TokenIssuer) -> Self {
        Self { accounts, tokens }
    }

    pub async fn register(&self, input: RegistrationInput) -> Result<AuthRes, AppError> {
        let registration = validation::validate_registration(&input)?;

        match self.accounts.find_account_by_email(registration.email.clone()).await {
            Ok(_) => return Err(AppError::Conflict("User already exists with this email".into())),
            Err(StoreError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let password = registration.password;
        let password_hash = tokio::task::spawn_blocking(move || auth::hash_password(&password))
            .await
            .context("Password hashing task panicked")??;

        let account = self
            .accounts
            .create_account(NewAccount {
                name: registration.name,
                email: registration.email,
                password_hash,
            })
            .await?;
        info!("Registered user {}", account.id);

        self.respond_with_token(account)
    }

    pub async fn login(&self, input: LoginInput) -> Result<AuthRes, AppError> {
        let credentials = validation::validate_login(&input)?;
        let invalid = || AppError::Authentication("Invalid email or password".into());

        let account = match self.accounts.find_account_by_email(credentials.email).await {
            Ok(account) => account,
            Err(StoreError::NotFound) => return Err(invalid()),
            Err(err) => return Err(err.into()),
        };

        let hash = account.password_hash.clone();
        let password = credentials.password;
        let verified = tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
            .await
            .context("Password verification task panicked")?;
        if !verified {
            return Err(invalid());
        }

        self.respond_with_token(account)
    }

    pub async fn profile(&self, user_id: i32) -> Result<ProfileRes, AppError> {
        match self.accounts.find_account(user_id).await {
            Ok(account) => Ok(account.into()),
            Err(StoreError::NotFound) => Err(AppError::NotFound("User not found".into())),
            Err(err) => Err(err.into()),
        }
    }

    fn respond_with_token(&self, account: Account) -> Result<AuthRes, AppError> {
        let token = self.tokens.issue(account.id)?;
        Ok(AuthRes {
            id: account.id,
            name: account.name,
            email: account.email,
            token,
        })
    }
}
