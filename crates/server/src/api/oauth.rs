//! Federated login routes for the two configured providers.
//!
//! Each provider gets the same pair of routes: an initiate endpoint that
//! bounces the browser to the provider's authorize page, and the callback
//! the provider redirects back to. Failures anywhere in the round trip land
//! on the login page; nothing is retried automatically.

use crate::api::{AUTH_TAG, ServerState, login_retry_redirect};
use crate::auth::oauth::OAuthFlow;
use crate::auth::session;
use crate::error::AuthError;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Query parameters the provider echoes back to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Creates the federated-login router.
pub fn router() -> OpenApiRouter<ServerState> {
    OpenApiRouter::new()
        .routes(routes!(google_authorize))
        .routes(routes!(google_callback))
        .routes(routes!(facebook_authorize))
        .routes(routes!(facebook_callback))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/auth/google",
    tag = AUTH_TAG,
    operation_id = "Google Authorize",
    summary = "Start the Google sign-in round trip",
    responses(
        (status = 303, description = "Redirect to Google's authorization endpoint"),
    )
)]
async fn google_authorize(State(state): State<ServerState>, session: Session) -> Response {
    start_flow(&state.google, &session).await
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/auth/google/secrets",
    tag = AUTH_TAG,
    operation_id = "Google Callback",
    summary = "Complete the Google sign-in round trip",
    description = "Provider callback. Validates the echoed state, exchanges the code, resolves \
                   the provider identity to a local account and establishes the session.",
    responses(
        (status = 303, description = "Redirect to /secrets on success, to /login on any failure"),
    )
)]
async fn google_callback(
    State(state): State<ServerState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let flow = state.google.clone();
    finish_flow(&state, &flow, &session, query).await
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/auth/facebook",
    tag = AUTH_TAG,
    operation_id = "Facebook Authorize",
    summary = "Start the Facebook sign-in round trip",
    responses(
        (status = 303, description = "Redirect to Facebook's authorization endpoint"),
    )
)]
async fn facebook_authorize(State(state): State<ServerState>, session: Session) -> Response {
    start_flow(&state.facebook, &session).await
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/auth/facebook/secrets",
    tag = AUTH_TAG,
    operation_id = "Facebook Callback",
    summary = "Complete the Facebook sign-in round trip",
    responses(
        (status = 303, description = "Redirect to /secrets on success, to /login on any failure"),
    )
)]
async fn facebook_callback(
    State(state): State<ServerState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let flow = state.facebook.clone();
    finish_flow(&state, &flow, &session, query).await
}

async fn start_flow(flow: &OAuthFlow, session: &Session) -> Response {
    match flow.authorize_url(session).await {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => {
            tracing::error!(provider = %flow.provider(), error = %e, "could not start provider flow");
            login_retry_redirect().into_response()
        }
    }
}

async fn finish_flow(
    state: &ServerState,
    flow: &OAuthFlow,
    session: &Session,
    query: CallbackQuery,
) -> Response {
    if let Some(denied) = query.error {
        tracing::warn!(provider = %flow.provider(), error = %denied, "provider denied authorization");
        return login_retry_redirect().into_response();
    }
    let (Some(code), Some(echoed_state)) = (query.code, query.state) else {
        tracing::warn!(provider = %flow.provider(), "callback missing code or state");
        return login_retry_redirect().into_response();
    };

    match complete(state, flow, session, &code, &echoed_state).await {
        Ok(()) => Redirect::to("/secrets").into_response(),
        Err(e) => {
            if e.is_credential_failure() {
                tracing::warn!(provider = %flow.provider(), error = %e, "callback rejected");
            } else {
                tracing::error!(provider = %flow.provider(), error = %e, "callback failed");
            }
            login_retry_redirect().into_response()
        }
    }
}

async fn complete(
    state: &ServerState,
    flow: &OAuthFlow,
    session: &Session,
    code: &str,
    echoed_state: &str,
) -> Result<(), AuthError> {
    let profile = flow.exchange(session, code, echoed_state).await?;
    let user = state
        .resolver
        .resolve(
            flow.provider(),
            &profile.subject,
            profile.display_name.as_deref(),
        )
        .await?;
    session::establish(session, &user).await
}
