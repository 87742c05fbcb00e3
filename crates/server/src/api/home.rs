//! Landing page.

use crate::api::health::MISC_TAG;
use crate::api::{ServerState, render};
use crate::auth::MaybeUser;
use crate::auth::session::SessionUser;
use askama::Template;
use axum::response::Response;
use utoipa_axum::{router::OpenApiRouter, routes};

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    user: Option<SessionUser>,
}

pub fn router() -> OpenApiRouter<ServerState> {
    OpenApiRouter::new().routes(routes!(home))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/",
    tag = MISC_TAG,
    operation_id = "Home Page",
    summary = "Landing page",
    description = "Public landing page; adapts to whether the caller already has a session.",
    responses(
        (status = 200, description = "Landing page HTML"),
    )
)]
async fn home(MaybeUser(user): MaybeUser) -> Response {
    render(HomeTemplate { user })
}
