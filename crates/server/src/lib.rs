//! A small secret-sharing web application.
//!
//! The core of the crate is the authentication and session-identity
//! subsystem in [`auth`]: local username/password accounts, federated
//! Google/Facebook sign-in, and the session gate in front of the protected
//! secret records. The HTTP surface lives in [`api`]; schema migrations are
//! owned by the sibling `migration` crate.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

pub mod api;
pub mod auth;
pub mod config;
pub mod entity;
pub mod error;

/// Process-wide handles shared by every request.
#[derive(Clone, Debug)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
}
