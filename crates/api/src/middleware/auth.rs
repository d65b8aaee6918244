//! Actor-identity middleware for protected routes.
//!
//! Authentication itself happens upstream: the gateway validates the
//! session and forwards the authenticated `(account id, role)` pair in
//! the `X-Actor-Id` and `X-Actor-Role` headers. This middleware turns
//! those headers into an [`Actor`] extension and rejects requests that
//! arrive without them. Role gates (e.g. only approved agents may
//! cash-out) are likewise enforced upstream, before the ledger is
//! invoked.

use axum::{
    Json,
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use paygo_shared::types::AccountId;
use serde_json::json;
use std::str::FromStr;

/// Header carrying the authenticated account id.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the authenticated role.
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Role of the authenticated actor, as asserted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    /// Back-office administrator.
    Admin,
    /// Regular wallet holder.
    User,
    /// Cash-in/cash-out service point.
    Agent,
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "agent" => Ok(Self::Agent),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// The authenticated actor attached to a request.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// The actor's account id.
    pub account_id: AccountId,
    /// The actor's role.
    pub role: ActorRole,
}

fn unauthorized(error: &'static str, message: &'static str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Middleware that requires a gateway-validated actor identity.
pub async fn actor_middleware(mut request: Request, next: Next) -> Response {
    let account_id = request
        .headers()
        .get(ACTOR_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| AccountId::from_str(value).ok());
    let Some(account_id) = account_id else {
        return unauthorized(
            "missing_actor",
            "X-Actor-Id header with a valid account id is required",
        );
    };

    let role = request
        .headers()
        .get(ACTOR_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| ActorRole::from_str(value).ok());
    let Some(role) = role else {
        return unauthorized(
            "missing_role",
            "X-Actor-Role header with a valid role is required",
        );
    };

    request.extensions_mut().insert(Actor { account_id, role });
    next.run(request).await
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().copied().ok_or_else(|| {
            unauthorized("missing_actor", "Request reached a handler without an actor")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_role_parsing() {
        assert_eq!(ActorRole::from_str("admin").unwrap(), ActorRole::Admin);
        assert_eq!(ActorRole::from_str("USER").unwrap(), ActorRole::User);
        assert_eq!(ActorRole::from_str("Agent").unwrap(), ActorRole::Agent);
        assert!(ActorRole::from_str("owner").is_err());
        assert!(ActorRole::from_str("").is_err());
    }
}
