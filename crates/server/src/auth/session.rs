//! Session payload codec.
//!
//! What the session holds is deliberately minimal: the account id and the
//! username, nothing else. The password hash and provider links never leave
//! the credential store. The session store answers "is this request
//! authenticated"; anything richer is re-fetched from the store by id.

use crate::entity::user;
use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session storage key for the authenticated identity.
pub const SESSION_USER_KEY: &str = "auth.user";

/// The minimal identity reference carried across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub username: Option<String>,
}

impl SessionUser {
    pub fn from_user(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

/// Decode the identity stored on the session, if any.
///
/// A missing key, a deserialization mismatch and a store failure all read
/// as "not authenticated".
pub async fn current_user(session: &Session) -> Option<SessionUser> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .ok()
        .flatten()
}

/// Store the encoded identity, rotating the session id first so a
/// pre-authentication session id never survives into an authenticated one.
#[tracing::instrument(skip_all, fields(user_id = %user.id))]
pub async fn establish(session: &Session, user: &user::Model) -> Result<(), AuthError> {
    session.cycle_id().await?;
    session
        .insert(SESSION_USER_KEY, SessionUser::from_user(user))
        .await?;
    Ok(())
}

/// Drop the session unconditionally.
///
/// Store errors are logged and swallowed: logout must always leave the
/// client signed out, whatever the store reports.
pub async fn clear(session: &Session) {
    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "failed to destroy session on logout");
    }
}
