use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{
        HeaderMap,
        header::{AUTHORIZATION, REFERER, USER_AGENT},
        request::Parts,
    },
};

use crate::{app_error::AppError, app_state::AppState};

/// Authenticated user id, resolved from the `Authorization: Bearer <token>` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i32);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("Not authorized, no token".into()))?;
        state.tokens.resolve_identity(token).map(AuthUser)
    }
}

/// Anonymous callers and unusable tokens both yield `None`.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(bearer_token(&parts.headers)
            .and_then(|token| state.tokens.resolve_identity(token).ok())
            .map(AuthUser))
    }
}

/// Request details recorded with tracking events.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub referer: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        // first hop of X-Forwarded-For is the client
        let ip_address = header("x-forwarded-for")
            .and_then(|chain| chain.split(',').next().map(|ip| ip.trim().to_string()))
            .filter(|ip| !ip.is_empty())
            .or_else(|| header("x-real-ip"));

        Ok(RequestMeta {
            referer: header(REFERER.as_str()),
            ip_address,
            user_agent: header(USER_AGENT.as_str()),
        })
    }
}
