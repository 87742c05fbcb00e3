//! Local login and logout.

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

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: Option<String>,
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Form data for login submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Creates the login router.
pub fn router() -> OpenApiRouter<ServerState> {
    OpenApiRouter::new()
        .routes(routes!(login_page))
        .routes(routes!(login_submit))
        .routes(routes!(logout))
}

/// Display the login page.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/login",
    tag = AUTH_TAG,
    operation_id = "Login Page",
    summary = "Display the login page",
    description = "Renders the login form. Offers local username/password login plus links into \
                   the Google and Facebook authorization flows.",
    params(
        ("error" = Option<String>, Query, description = "Error message to display."),
    ),
    responses(
        (status = 200, description = "Login page HTML"),
        (status = 500, description = "Internal server error"),
    )
)]
async fn login_page(Query(params): Query<LoginQuery>) -> Response {
    render(LoginTemplate {
        error: params.error,
    })
}

/// Handle login form submission.
#[tracing::instrument(skip(state, session, form), fields(username = %form.username))]
#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_TAG,
    operation_id = "Login Submit",
    summary = "Submit login credentials",
    description = "Verifies the password against the stored credential and establishes a session. \
                   An unknown username and a wrong password answer identically, so the endpoint \
                   cannot be used to enumerate accounts.",
    request_body(
        content = LoginForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Local login credentials"
    ),
    responses(
        (status = 303, description = "Redirect to /secrets on success, back to /login on failure"),
    )
)]
async fn login_submit(
    State(state): State<ServerState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match try_login(&state, &session, &form).await {
        Ok(()) => Redirect::to("/secrets").into_response(),
        Err(e) => {
            if e.is_credential_failure() {
                tracing::warn!(username = %form.username, "login rejected");
            } else {
                tracing::error!(error = %e, "login failed");
            }
            login_retry_redirect().into_response()
        }
    }
}

/// Unknown username, missing credential and wrong password all exit through
/// [`AuthError::InvalidCredential`], taking the same path out.
async fn try_login(
    state: &ServerState,
    session: &Session,
    form: &LoginForm,
) -> Result<(), AuthError> {
    let user = state
        .store
        .find_by_username(form.username.trim())
        .await?
        .ok_or(AuthError::InvalidCredential)?;

    let stored = user
        .password_hash
        .as_deref()
        .ok_or(AuthError::InvalidCredential)?;
    if !password::verify_password(&form.password, stored) {
        return Err(AuthError::InvalidCredential);
    }

    state.store.touch_last_login(&user).await?;
    session::establish(session, &user).await
}

/// Destroy the caller's session.
#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/logout",
    tag = AUTH_TAG,
    operation_id = "Logout",
    summary = "Sign out",
    description = "Clears the session on every path, including when the session store reports an \
                   error; failures are logged, never surfaced.",
    responses(
        (status = 303, description = "Redirect to the landing page"),
    )
)]
async fn logout(session: Session) -> Redirect {
    session::clear(&session).await;
    Redirect::to("/")
}
