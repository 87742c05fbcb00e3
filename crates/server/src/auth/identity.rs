//! Identity resolution for federated logins.
//!
//! Both OAuth callbacks funnel through [`IdentityResolver::resolve`], the
//! single entry point that turns a provider-assigned identity into a local
//! account.

use crate::auth::store::CredentialStore;
use crate::entity::provider_identity::Provider;
use crate::entity::user;
use crate::error::AuthError;

#[derive(Clone)]
pub struct IdentityResolver {
    store: CredentialStore,
}

impl IdentityResolver {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    /// Map a provider identity onto a local account, creating one on first
    /// sight.
    ///
    /// The subject is the only linking key. An empty subject would fold
    /// every such login into one shared account, so it is rejected before
    /// the store is touched. Repeated calls with the same pair always return
    /// the same account id.
    #[tracing::instrument(skip(self, display_name))]
    pub async fn resolve(
        &self,
        provider: Provider,
        subject: &str,
        display_name: Option<&str>,
    ) -> Result<user::Model, AuthError> {
        if subject.trim().is_empty() {
            return Err(AuthError::ProviderIdentityInvalid);
        }

        let user = self
            .store
            .create_or_get_by_provider(provider, subject, display_name)
            .await?;
        self.store.touch_last_login(&user).await?;
        Ok(user)
    }
}
