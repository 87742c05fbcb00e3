//! Federated-login flow against an external OAuth2 provider.
//!
//! One [`OAuthFlow`] per provider, built once at startup from an explicit
//! [`ProviderConfig`] and handed to the router as shared state. The two
//! steps of the dance run in different request lifetimes; the only thing
//! carried across is the CSRF state parameter, parked on the caller's
//! session between redirect-out and callback.

use crate::entity::provider_identity::Provider;
use crate::error::AuthError;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use tower_sessions::Session;

use crate::config::ProviderCredentials;

/// Static endpoint set plus client credentials for one provider.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,
    pub callback_url: String,
    pub scopes: Vec<String>,
}

impl ProviderConfig {
    pub fn google(creds: &ProviderCredentials, public_url: &str) -> Self {
        Self {
            provider: Provider::Google,
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token_url: "https://oauth2.googleapis.com/token".into(),
            user_info_url: "https://www.googleapis.com/oauth2/v3/userinfo".into(),
            callback_url: callback_or_default(creds, public_url, Provider::Google),
            scopes: vec!["openid".into(), "profile".into()],
        }
    }

    pub fn facebook(creds: &ProviderCredentials, public_url: &str) -> Self {
        Self {
            provider: Provider::Facebook,
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
            auth_url: "https://www.facebook.com/v19.0/dialog/oauth".into(),
            token_url: "https://graph.facebook.com/v19.0/oauth/access_token".into(),
            user_info_url: "https://graph.facebook.com/me".into(),
            callback_url: callback_or_default(creds, public_url, Provider::Facebook),
            scopes: vec!["public_profile".into()],
        }
    }
}

fn callback_or_default(
    creds: &ProviderCredentials,
    public_url: &str,
    provider: Provider,
) -> String {
    creds.callback_url.clone().unwrap_or_else(|| {
        format!(
            "{}/auth/{provider}/secrets",
            public_url.trim_end_matches('/')
        )
    })
}

/// What the callback hands to identity resolution. Only `subject` is a
/// linking key; the display name is informational.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub subject: String,
    pub display_name: Option<String>,
}

pub struct OAuthFlow {
    config: ProviderConfig,
    client: BasicClient,
    http: reqwest::Client,
}

impl OAuthFlow {
    pub fn new(config: ProviderConfig) -> Result<Self, oauth2::url::ParseError> {
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone())?,
            Some(TokenUrl::new(config.token_url.clone())?),
        )
        .set_redirect_uri(RedirectUrl::new(config.callback_url.clone())?);

        Ok(Self {
            config,
            client,
            http: reqwest::Client::new(),
        })
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    fn state_key(&self) -> String {
        format!("oauth.state.{}", self.config.provider)
    }

    /// Step 1: build the provider authorize redirect, parking the CSRF state
    /// on the session. No other local state is written; an abandoned flow
    /// leaves nothing to clean up.
    #[tracing::instrument(skip(self, session), fields(provider = %self.config.provider))]
    pub async fn authorize_url(&self, session: &Session) -> Result<String, AuthError> {
        let mut request = self.client.authorize_url(CsrfToken::new_random);
        for scope in &self.config.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (url, csrf) = request.url();

        session.insert(&self.state_key(), csrf.secret().clone()).await?;
        Ok(url.to_string())
    }

    /// Step 2: validate the echoed state, trade the code for an access token
    /// and read the provider's profile document.
    ///
    /// The stored state is consumed whatever happens, so a failed callback
    /// cannot be replayed against the same session.
    #[tracing::instrument(skip_all, fields(provider = %self.config.provider))]
    pub async fn exchange(
        &self,
        session: &Session,
        code: &str,
        state: &str,
    ) -> Result<ResolvedProfile, AuthError> {
        let expected: Option<String> = session.remove(&self.state_key()).await?;
        match expected {
            Some(expected) if expected == state => {}
            _ => {
                return Err(AuthError::ProviderRoundTrip(
                    "state parameter mismatch".into(),
                ));
            }
        }

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::ProviderRoundTrip(format!("code exchange failed: {e}")))?;

        let profile: serde_json::Value = self
            .http
            .get(&self.config.user_info_url)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .map_err(|e| AuthError::ProviderRoundTrip(format!("profile fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| AuthError::ProviderRoundTrip(format!("profile fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::ProviderRoundTrip(format!("profile was not valid JSON: {e}")))?;

        let subject = profile
            .get(self.config.provider.subject_field())
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if subject.is_empty() {
            return Err(AuthError::ProviderIdentityInvalid);
        }

        let display_name = profile
            .get("name")
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(ResolvedProfile {
            subject,
            display_name,
        })
    }
}
