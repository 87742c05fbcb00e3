//! User entity - one row per account, local or federated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Local login name. Absent for accounts created through a provider.
    #[sea_orm(unique)]
    pub username: Option<String>,
    /// PHC-format Argon2id hash. Absent for provider-only accounts and
    /// never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_login_at: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::provider_identity::Entity")]
    ProviderIdentities,
    #[sea_orm(has_many = "super::secret::Entity")]
    Secrets,
}

impl Related<super::provider_identity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProviderIdentities.def()
    }
}

impl Related<super::secret::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Secrets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
