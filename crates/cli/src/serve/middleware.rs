//! Caller identity forwarded by the upstream gateway.
//!
//! The gateway authenticates the user and passes `X-User-Id` and
//! `X-User-Role` through. Requests without them are rejected with 401;
//! handlers check the role against the route's allow-list and answer 403.

use std::fmt;
use std::str::FromStr;

use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use fleetflow_core::ActorId;

use super::json_error;
use super::response::ApiError;

pub(crate) const USER_ID_HEADER: &str = "x-user-id";
pub(crate) const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Manager,
    Dispatcher,
    SafetyOfficer,
}

impl Role {
    /// Roles allowed to read trips.
    pub(crate) const TRIP_READERS: &'static [Role] =
        &[Role::Manager, Role::Dispatcher, Role::SafetyOfficer];
    /// Roles allowed to create and advance trips.
    pub(crate) const TRIP_WRITERS: &'static [Role] = &[Role::Manager, Role::Dispatcher];
    pub(crate) const MANAGERS: &'static [Role] = &[Role::Manager];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Role::Manager => "MANAGER",
            Role::Dispatcher => "DISPATCHER",
            Role::SafetyOfficer => "SAFETY_OFFICER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts `MANAGER`, `manager` and the Spring-style `ROLE_MANAGER`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        let bare = upper.strip_prefix("ROLE_").unwrap_or(&upper);
        match bare {
            "MANAGER" => Ok(Role::Manager),
            "DISPATCHER" => Ok(Role::Dispatcher),
            "SAFETY_OFFICER" => Ok(Role::SafetyOfficer),
            _ => Err(format!("unknown role '{}'", s.trim())),
        }
    }
}

/// Why a request could not be attributed to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthFailure {
    /// 401: a header is absent or malformed.
    Missing(&'static str),
    /// 403: authenticated, but with a role that is allowed nothing.
    UnknownRole(String),
}

/// The authenticated caller, stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Principal {
    pub(crate) actor: ActorId,
    pub(crate) role: Role,
}

impl Principal {
    fn from_headers(headers: &HeaderMap) -> Result<Self, AuthFailure> {
        let actor = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .ok_or(AuthFailure::Missing(
                "authentication required: missing or invalid X-User-Id",
            ))?;
        let role = headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .ok_or(AuthFailure::Missing(
                "authentication required: missing X-User-Role",
            ))?;
        let role = role.parse().map_err(AuthFailure::UnknownRole)?;
        Ok(Principal {
            actor: ActorId(actor),
            role,
        })
    }

    pub(crate) fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "role {} may not perform this action",
                self.role
            )))
        }
    }
}

/// Resolve the caller from gateway headers before routing to a handler.
pub(crate) async fn auth_middleware(mut request: Request<axum::body::Body>, next: Next) -> Response {
    match Principal::from_headers(request.headers()) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(AuthFailure::Missing(message)) => {
            json_error(StatusCode::UNAUTHORIZED, message).into_response()
        }
        Err(AuthFailure::UnknownRole(message)) => {
            json_error(StatusCode::FORBIDDEN, &message).into_response()
        }
    }
}
