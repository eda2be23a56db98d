use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gym_crm::api::{create_routes, AppState};
use gym_crm::auth::PasswordHasher;
use gym_crm::config::{ensure_admin, AppConfig};
use gym_crm::repository::{InMemoryStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(?config, "starting gym-crm");

    let store: Arc<dyn Store> = match &config.database {
        Some(database) => Arc::new(database.connect().await?),
        None => {
            info!("using in-memory storage, data is lost on shutdown");
            Arc::new(InMemoryStore::new())
        }
    };

    let hasher = PasswordHasher::new(config.bcrypt_cost);
    ensure_admin(
        store.as_ref(),
        &hasher,
        &config.admin_username,
        config.admin_password.as_deref(),
    )
    .await?;

    let state = AppState::new(store, &config.jwt_secret, config.token_ttl(), hasher);
    let app = create_routes(state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!("gym-crm listening on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
