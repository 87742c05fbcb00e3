use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Client credentials for one OAuth2 provider.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
    /// Explicit callback override. Defaults to
    /// `{public_url}/auth/{provider}/secrets`.
    #[serde(default)]
    pub callback_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SessionConfig {
    /// Sessions expire after this many minutes without a request.
    #[serde(default = "default_inactivity_minutes")]
    pub inactivity_timeout_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_minutes: default_inactivity_minutes(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Externally reachable base URL, used to build provider callback URLs.
    pub public_url: String,
    #[serde(default)]
    pub session: SessionConfig,
    pub google: ProviderCredentials,
    pub facebook: ProviderCredentials,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_inactivity_minutes() -> i64 {
    30
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.public_url.starts_with("http://") && !self.public_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "public_url must start with http:// or https://".into(),
            ));
        }
        if self.session.inactivity_timeout_minutes <= 0 {
            return Err(ConfigError::Validation(
                "session.inactivity_timeout_minutes must be > 0".into(),
            ));
        }
        for (name, creds) in [("google", &self.google), ("facebook", &self.facebook)] {
            if creds.client_id.is_empty() || creds.client_secret.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{name}.client_id and {name}.client_secret must be set"
                )));
            }
        }
        Ok(())
    }
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Any environment variable matching the key path separated by double
/// underscores (e.g. `GOOGLE__CLIENT_ID`) overrides the file value.
///
/// Returns a `ConfigError` instead of panicking so the caller can decide how
/// to fail.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml"))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;

    Ok(app)
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            listen_addr: default_listen_addr(),
            public_url: "http://localhost:3000".into(),
            session: SessionConfig::default(),
            google: ProviderCredentials {
                client_id: "gid".into(),
                client_secret: "gsecret".into(),
                callback_url: None,
            },
            facebook: ProviderCredentials {
                client_id: "fid".into(),
                client_secret: "fsecret".into(),
                callback_url: None,
            },
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn rejects_non_http_public_url() {
        let mut cfg = valid_config();
        cfg.public_url = "localhost:3000".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("public_url")
        ));
    }

    #[test]
    fn rejects_empty_provider_credentials() {
        let mut cfg = valid_config();
        cfg.facebook.client_secret = String::new();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation(msg)) if msg.contains("facebook")
        ));
    }

    #[test]
    fn rejects_zero_session_timeout() {
        let mut cfg = valid_config();
        cfg.session.inactivity_timeout_minutes = 0;
        assert!(cfg.validate().is_err());
    }
}
