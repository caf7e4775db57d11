//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use liveq_common::AppError;

/// Host authorization code extractor.
///
/// Accepts either an `x-host-code` header or an `Authorization` header in
/// the form `Host <code>`. The code is an opaque bearer; handlers compare
/// it against the event's stored host code.
#[derive(Debug, Clone)]
pub struct HostCode(pub String);

impl<S> FromRequestParts<S> for HostCode
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get("x-host-code")
            && let Ok(code) = value.to_str()
            && !code.is_empty()
        {
            return Ok(Self(code.to_string()));
        }

        if let Some(value) = parts.headers.get("authorization")
            && let Ok(auth) = value.to_str()
            && let Some(code) = auth.strip_prefix("Host ")
            && !code.is_empty()
        {
            return Ok(Self(code.to_string()));
        }

        Err(AppError::Unauthorized)
    }
}

/// Attendee session token extractor (`x-session-id` header).
///
/// Absent or empty tokens resolve to `None`; the attendee service mints a
/// fresh token and the handler echoes it back in the response.
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("x-session-id")
            .and_then(|v| v.to_str().ok())
            .filter(|t| !t.is_empty())
            .map(ToString::to_string);

        Ok(Self(token))
    }
}
