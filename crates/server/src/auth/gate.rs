//! The request-time authentication gate.
//!
//! [`RequireUser`] is the single checkpoint: protected handlers take it as
//! an extractor argument, so their bodies cannot run without a session that
//! decodes to an identity. Rejection is always a redirect to the login page,
//! never an error page.

use crate::auth::session::{self, SessionUser};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;
use tower_sessions::Session;

/// Extractor for routes that must not execute unauthenticated.
pub struct RequireUser(pub SessionUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| Redirect::to("/login"))?;

        match session::current_user(&session).await {
            Some(user) => Ok(RequireUser(user)),
            None => Err(Redirect::to("/login")),
        }
    }
}

/// Non-rejecting variant for pages that only adapt to auth state.
pub struct MaybeUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await else {
            return Ok(MaybeUser(None));
        };
        Ok(MaybeUser(session::current_user(&session).await))
    }
}
