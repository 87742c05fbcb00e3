//! Credential store - the single owner of user identity records.
//!
//! Duplicate prevention for `username` and `(provider, subject)` is the
//! backing store's job: both are covered by unique indexes, and the create
//! methods translate violations instead of racing a check-then-act lookup.

use crate::entity::provider_identity::{self, Provider};
use crate::entity::user;
use crate::error::AuthError;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    SqlErr,
};
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<DatabaseConnection>,
}

impl CredentialStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, AuthError> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<Option<user::Model>, AuthError> {
        Ok(user::Entity::find_by_id(id).one(self.db.as_ref()).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_provider(
        &self,
        provider: Provider,
        subject: &str,
    ) -> Result<Option<user::Model>, AuthError> {
        let link = provider_identity::Entity::find()
            .filter(provider_identity::Column::Provider.eq(provider.as_str()))
            .filter(provider_identity::Column::Subject.eq(subject))
            .one(self.db.as_ref())
            .await?;

        match link {
            Some(link) => Ok(user::Entity::find_by_id(&link.user_id)
                .one(self.db.as_ref())
                .await?),
            None => Ok(None),
        }
    }

    /// Create a local username/password account.
    ///
    /// The unique index on `username` is the authority on duplicates; a
    /// violation maps to [`AuthError::DuplicateUsername`] and leaves the
    /// existing row untouched.
    #[tracing::instrument(skip(self, password_hash))]
    pub async fn create_local(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<user::Model, AuthError> {
        let row = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(Some(username.to_string())),
            password_hash: Set(Some(password_hash.to_string())),
            created_at: Set(OffsetDateTime::now_utc()),
            last_login_at: Set(None),
        };

        match row.insert(self.db.as_ref()).await {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Err(AuthError::DuplicateUsername),
            Err(e) => Err(e.into()),
        }
    }

    /// Atomic find-or-create keyed on `(provider, subject)`.
    ///
    /// Losing an insert race against the composite unique index is not an
    /// error: the orphaned user row is dropped, the winner's row is fetched,
    /// and concurrent calls for the same pair converge on a single account.
    #[tracing::instrument(skip(self))]
    pub async fn create_or_get_by_provider(
        &self,
        provider: Provider,
        subject: &str,
        display_name: Option<&str>,
    ) -> Result<user::Model, AuthError> {
        if let Some(existing) = self.find_by_provider(provider, subject).await? {
            return Ok(existing);
        }

        let now = OffsetDateTime::now_utc();
        let user = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(None),
            password_hash: Set(None),
            created_at: Set(now),
            last_login_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await?;

        let link = provider_identity::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user.id.clone()),
            provider: Set(provider.as_str().to_string()),
            subject: Set(subject.to_string()),
            display_name: Set(display_name.map(String::from)),
            created_at: Set(now),
        };

        match link.insert(self.db.as_ref()).await {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                // Another request linked this pair first; our user row has no
                // credential path and must not survive.
                user::Entity::delete_by_id(&user.id)
                    .exec(self.db.as_ref())
                    .await?;
                self.find_by_provider(provider, subject).await?.ok_or_else(|| {
                    AuthError::Persistence(sea_orm::DbErr::RecordNotFound(format!(
                        "provider identity ({provider}, {subject}) vanished after unique violation"
                    )))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Bookkeeping on every successful authentication.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn touch_last_login(&self, user: &user::Model) -> Result<(), AuthError> {
        let mut active: user::ActiveModel = user.clone().into();
        active.last_login_at = Set(Some(OffsetDateTime::now_utc()));
        active.update(self.db.as_ref()).await?;
        Ok(())
    }
}

fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
