use std::net::SocketAddr;
use std::sync::Arc;

use quiz_backend::{
    config::{get_config, init_config},
    create_router,
    database::pool::{create_pool, run_migrations},
    repository::PgQuizStore,
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    init_config()?;
    let config = get_config()?;

    let pool = create_pool(config).await?;
    info!("Database connected");
    run_migrations(&pool).await?;
    info!("Migrations applied");

    let store = Arc::new(PgQuizStore::new(pool));
    let app = create_router(AppState::new(store, config));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
