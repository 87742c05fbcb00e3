//! The protected resource: the caller's secrets.
//!
//! Every handler here takes [`RequireUser`], so none of them can run
//! without a decoded session. List and delete are scoped to the owning
//! user; deleting somebody else's secret id silently affects zero rows.

use crate::api::{SECRETS_TAG, ServerState, render};
use crate::auth::RequireUser;
use crate::entity::secret;
use askama::Template;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use time::OffsetDateTime;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Secrets list template.
#[derive(Template)]
#[template(path = "secrets.html")]
struct SecretsTemplate {
    secrets: Vec<secret::Model>,
}

/// Submit form template.
#[derive(Template)]
#[template(path = "submit.html")]
struct SubmitTemplate;

/// Form data for submitting a secret.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitForm {
    pub secret: String,
}

/// Form data for deleting a secret.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteForm {
    pub checkbox: i32,
}

/// Creates the secrets router.
pub fn router() -> OpenApiRouter<ServerState> {
    OpenApiRouter::new()
        .routes(routes!(list_secrets))
        .routes(routes!(submit_page))
        .routes(routes!(submit_secret))
        .routes(routes!(delete_secret))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.0.id))]
#[utoipa::path(
    get,
    path = "/secrets",
    tag = SECRETS_TAG,
    operation_id = "List Secrets",
    summary = "List the caller's secrets",
    security(("session" = [])),
    responses(
        (status = 200, description = "Secrets list HTML"),
        (status = 303, description = "Redirect to /login without a valid session"),
    )
)]
async fn list_secrets(State(state): State<ServerState>, user: RequireUser) -> Response {
    let RequireUser(user) = user;
    match secret::Entity::find()
        .filter(secret::Column::OwnerId.eq(&user.id))
        .order_by_asc(secret::Column::Id)
        .all(state.resources.db.as_ref())
        .await
    {
        Ok(secrets) => render(SecretsTemplate { secrets }),
        Err(e) => {
            tracing::error!(error = %e, "failed to load secrets");
            Redirect::to("/").into_response()
        }
    }
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/submit",
    tag = SECRETS_TAG,
    operation_id = "Submit Page",
    summary = "Display the submit form",
    security(("session" = [])),
    responses(
        (status = 200, description = "Submit form HTML"),
        (status = 303, description = "Redirect to /login without a valid session"),
    )
)]
async fn submit_page(_user: RequireUser) -> Response {
    render(SubmitTemplate)
}

#[tracing::instrument(skip(state, user, form), fields(user_id = %user.0.id))]
#[utoipa::path(
    post,
    path = "/submit",
    tag = SECRETS_TAG,
    operation_id = "Submit Secret",
    summary = "Store a new secret owned by the caller",
    security(("session" = [])),
    request_body(
        content = SubmitForm,
        content_type = "application/x-www-form-urlencoded",
        description = "The secret text"
    ),
    responses(
        (status = 303, description = "Redirect to /secrets"),
    )
)]
async fn submit_secret(
    State(state): State<ServerState>,
    user: RequireUser,
    Form(form): Form<SubmitForm>,
) -> Response {
    let RequireUser(user) = user;
    let body = form.secret.trim();
    if body.is_empty() {
        return Redirect::to("/secrets").into_response();
    }

    let row = secret::ActiveModel {
        owner_id: Set(user.id),
        body: Set(body.to_string()),
        created_at: Set(OffsetDateTime::now_utc()),
        ..Default::default()
    };
    if let Err(e) = row.insert(state.resources.db.as_ref()).await {
        tracing::error!(error = %e, "failed to store secret");
    }

    Redirect::to("/secrets").into_response()
}

#[tracing::instrument(skip(state, user, form), fields(user_id = %user.0.id, secret_id = form.checkbox))]
#[utoipa::path(
    post,
    path = "/delete",
    tag = SECRETS_TAG,
    operation_id = "Delete Secret",
    summary = "Delete one of the caller's secrets",
    description = "Deletes the secret only when it belongs to the caller; foreign ids affect \
                   nothing.",
    security(("session" = [])),
    request_body(
        content = DeleteForm,
        content_type = "application/x-www-form-urlencoded",
        description = "Id of the secret to delete"
    ),
    responses(
        (status = 303, description = "Redirect to /secrets"),
    )
)]
async fn delete_secret(
    State(state): State<ServerState>,
    user: RequireUser,
    Form(form): Form<DeleteForm>,
) -> Response {
    let RequireUser(user) = user;
    match secret::Entity::delete_many()
        .filter(secret::Column::Id.eq(form.checkbox))
        .filter(secret::Column::OwnerId.eq(&user.id))
        .exec(state.resources.db.as_ref())
        .await
    {
        Ok(res) if res.rows_affected == 0 => {
            tracing::debug!("delete matched nothing (wrong id or wrong owner)");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(error = %e, "failed to delete secret");
        }
    }

    Redirect::to("/secrets").into_response()
}
