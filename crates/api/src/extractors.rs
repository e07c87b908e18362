//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use cuentas_shared::AppError;
use cuentas_shared::types::UserId;

use crate::error::ApiError;

/// Header naming the user performing the request.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The acting user, read from the `X-Actor-Id` header.
///
/// The header is optional; when present it must be a UUID. The id is stored
/// on ledger entries, payments, sales, and checks written by the request.
///
/// ```ignore
/// async fn handler(actor: Actor) -> impl IntoResponse {
///     let recorded_by = actor.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Actor(pub Option<UserId>);

impl Actor {
    /// Returns the acting user, if the request named one.
    #[must_use]
    pub const fn user_id(self) -> Option<UserId> {
        self.0
    }
}

fn parse_actor(value: &str) -> Result<UserId, AppError> {
    Uuid::parse_str(value.trim())
        .map(UserId::from_uuid)
        .map_err(|_| AppError::validation("X-Actor-Id", "actor id must be a UUID"))
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw) = parts.headers.get(ACTOR_HEADER) else {
            return Ok(Self(None));
        };
        let value = raw
            .to_str()
            .map_err(|_| AppError::validation("X-Actor-Id", "actor id must be ASCII"))?;
        Ok(Self(Some(parse_actor(value)?)))
    }
}
