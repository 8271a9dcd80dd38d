mod config;
mod db;
mod entities;
mod error;
mod models;
mod routes;
mod seed;
mod store;

use std::sync::Arc;

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::{Config, StoreKind},
    store::{MemoryStore, MovieStore, SqlStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MovieStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,catalog=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn MovieStore> = match config.store {
        StoreKind::Sql => {
            let db = db::connect_and_migrate(&config.database_url).await?;
            Arc::new(SqlStore::new(db))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory store, data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState { store });

    let app = routes::router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, store = ?config.store, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
