use std::sync::Arc;

use sea_orm::Database;
use secret_sharer::AppResources;
use secret_sharer::api::{ServerState, start_webserver};
use secret_sharer::auth::identity::IdentityResolver;
use secret_sharer::auth::oauth::{OAuthFlow, ProviderConfig};
use secret_sharer::auth::store::CredentialStore;
use secret_sharer::config::load_config_or_panic;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "secret_sharer=info,tower_http=info,sea_orm=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");
    dotenvy::dotenv().ok();
    initialize_tracing();

    // Load config
    let config = Arc::new(load_config_or_panic());

    // Set up SeaORM database connection. Failing here is the one fatal
    // startup condition; everything later recovers to a redirect.
    let db = Arc::new(
        Database::connect(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );

    let store = CredentialStore::new(db.clone());
    let resolver = IdentityResolver::new(store.clone());

    // One flow per provider, built once and injected; handlers never touch
    // provider credentials directly.
    let google = Arc::new(OAuthFlow::new(ProviderConfig::google(
        &config.google,
        &config.public_url,
    ))?);
    let facebook = Arc::new(OAuthFlow::new(ProviderConfig::facebook(
        &config.facebook,
        &config.public_url,
    ))?);

    let resources = AppResources { db, config };
    let state = ServerState {
        resources,
        store,
        resolver,
        google,
        facebook,
    };

    start_webserver(state).await
}
