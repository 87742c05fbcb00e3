//! Provider identity entity - links a user to a federated identity provider.
//!
//! A `(provider, subject)` pair resolves to at most one user; the composite
//! unique index created by the migration is what makes find-or-create safe
//! under concurrent callbacks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The federated identity providers this application trusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Google,
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Facebook => "facebook",
        }
    }

    /// Field of the provider's userinfo document carrying the
    /// provider-assigned user id.
    pub fn subject_field(&self) -> &'static str {
        match self {
            Provider::Google => "sub",
            Provider::Facebook => "id",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "provider_identity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Reference to user.id
    pub user_id: String,
    /// Provider name ("google" or "facebook")
    pub provider: String,
    /// Provider-assigned user identifier; the only trusted linking key
    pub subject: String,
    /// Display name reported by the provider. Informational only.
    pub display_name: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
