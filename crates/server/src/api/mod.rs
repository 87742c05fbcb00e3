//! HTTP surface for the secret sharer.
//!
//! This module is organized into submodules:
//! - `home` - Landing page (/)
//! - `login` - Local login and logout (/login, /logout)
//! - `register` - Local registration (/register)
//! - `oauth` - Federated login round trips (/auth/{provider}/...)
//! - `secrets` - The gate-checked protected resource (/secrets, /submit, /delete)
//! - `health` - Health check endpoint (/healthz)
//! - `openapi` - OpenAPI/Utoipa configuration

pub mod health;
pub mod home;
pub mod login;
pub mod oauth;
pub mod openapi;
pub mod register;
pub mod secrets;

use crate::AppResources;
use crate::auth::identity::IdentityResolver;
use crate::auth::oauth::OAuthFlow;
use crate::auth::store::CredentialStore;
use askama::Template;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use std::sync::Arc;
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// OpenAPI tag for authentication endpoints.
pub const AUTH_TAG: &str = "Authentication";
/// OpenAPI tag for the protected secret endpoints.
pub const SECRETS_TAG: &str = "Secrets";

/// Everything a request handler needs, assembled once at startup.
#[derive(Clone)]
pub struct ServerState {
    pub resources: AppResources,
    pub store: CredentialStore,
    pub resolver: IdentityResolver,
    pub google: Arc<OAuthFlow>,
    pub facebook: Arc<OAuthFlow>,
}

/// Redirect to the login page after a failed authentication attempt.
///
/// Every failure funnels through here with the same generic message, so the
/// response never narrows down which credential or step was wrong.
pub(crate) fn login_retry_redirect() -> Redirect {
    Redirect::to(&format!(
        "/login?error={}",
        urlencoding::encode("Unable to sign you in. Please try again.")
    ))
}

/// Render a page template, degrading to a terse 500 if rendering fails.
pub(crate) fn render<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render template");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Assemble the full application router.
///
/// Kept separate from the listener so tests can drive the router in-process
/// with its session layer attached.
pub fn build_router(state: ServerState) -> Router {
    let minutes = state.resources.config.session.inactivity_timeout_minutes;

    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .merge(home::router())
        .merge(login::router())
        .merge(register::router())
        .merge(oauth::router())
        .merge(secrets::router())
        .routes(routes!(health::health))
        .split_for_parts();

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(minutes)));

    router
        .with_state(state)
        .merge(Redoc::with_url("/api-docs", api))
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Starts the web server with all configured routes.
#[tracing::instrument(skip(state))]
pub async fn start_webserver(state: ServerState) -> color_eyre::Result<()> {
    let addr = state.resources.config.listen_addr.clone();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
