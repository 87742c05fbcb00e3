//! Local registration.

use crate::api::{AUTH_TAG, ServerState, login_retry_redirect, render};
use crate::auth::{password, session};
use crate::error::AuthError;
use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Registration page template.
#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    error: Option<String>,
}

/// Query parameters for the registration page.
#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    pub error: Option<String>,
}

/// Form data for registration submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

/// Creates the registration router.
pub fn router() -> OpenApiRouter<ServerState> {
    OpenApiRouter::new()
        .routes(routes!(register_page))
        .routes(routes!(register_submit))
}

/// Display the registration page.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/register",
    tag = AUTH_TAG,
    operation_id = "Register Page",
    summary = "Display the registration page",
    params(
        ("error" = Option<String>, Query, description = "Error message to display."),
    ),
    responses(
        (status = 200, description = "Registration page HTML"),
        (status = 500, description = "Internal server error"),
    )
)]
async fn register_page(Query(params): Query<RegisterQuery>) -> Response {
    render(RegisterTemplate {
        error: params.error,
    })
}

/// Handle registration form submission.
#[tracing::instrument(skip(state, session, form), fields(username = %form.username))]
#[utoipa::path(
    post,
    path = "/register",
    tag = AUTH_TAG,
    operation_id = "Register Submit",
    summary = "Create a local account",
    description = "Creates a username/password account and signs the caller in. A taken username \
                   redirects to the login page without touching the existing account, and without \
                   saying which part failed.",
    request_body(
        content = RegisterForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Registration data"
    ),
    responses(
        (status = 303, description = "Redirect to /secrets on success, to /login on failure"),
    )
)]
async fn register_submit(
    State(state): State<ServerState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    match try_register(&state, &session, &form).await {
        Ok(()) => Redirect::to("/secrets").into_response(),
        Err(e) => {
            if e.is_credential_failure() {
                tracing::warn!(username = %form.username, error = %e, "registration rejected");
            } else {
                tracing::error!(error = %e, "registration failed");
            }
            login_retry_redirect().into_response()
        }
    }
}

async fn try_register(
    state: &ServerState,
    session: &Session,
    form: &RegisterForm,
) -> Result<(), AuthError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Err(AuthError::InvalidCredential);
    }

    let hash =
        password::hash_password(&form.password).map_err(|e| AuthError::Hashing(e.to_string()))?;

    // The store's unique index decides duplicates; no lookup-first race.
    let user = state.store.create_local(username, &hash).await?;
    session::establish(session, &user).await
}
