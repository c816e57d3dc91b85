mod config;
mod handlers;
mod protocol;
mod reaper;
mod response;
mod store;
mod types;
mod week;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};

use crate::config::{AppState, ServerConfig};
use crate::reaper::spawn_session_reaper;
use crate::store::{MemoryStore, SqliteStore, Store};

fn open_store(config: &ServerConfig) -> std::io::Result<Arc<dyn Store>> {
    match &config.data_dir {
        Some(data_dir) => {
            let store = SqliteStore::open(data_dir).map_err(|e| {
                tracing::error!("failed to open score store: {e}");
                std::io::Error::other(e.to_string())
            })?;
            tracing::info!(data_dir = %data_dir.display(), "using SQLite score store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATA_DIR not set; sessions and scores are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(
        "starting lab panic api: bind_addr={} app_env={} public_base_url={} session_ttl_secs={} session_sweep_secs={}",
        config.bind_addr,
        config.app_env,
        config.public_base_url,
        config.session_ttl_secs,
        config.session_sweep_secs
    );

    // The only fatal error: without a store nothing can be served.
    let store = open_store(&config)?;
    spawn_session_reaper(store.clone(), config.session_sweep_secs);

    let state = AppState::new(store, &config);

    let mut server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(handlers::routes)
    });
    if let Some(workers) = config.http_workers {
        server = server.workers(workers);
    }

    server.bind(config.bind_addr.as_str())?.run().await
}
