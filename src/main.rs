use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use taskgate::{
    auth::TokenMiddleware,
    config::{Config, StorageBackend},
    routes,
    store::{InMemoryStore, PgStore},
    AppState,
};

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;
    log::debug!("Loaded configuration: {:?}", config);

    let state = match (config.storage, &config.database) {
        (StorageBackend::Postgres, Some(database)) => {
            let store = PgStore::connect(database).await.map_err(startup_error)?;
            AppState::from_config(Arc::new(store), &config)
        }
        (StorageBackend::Postgres, None) => {
            return Err(startup_error("database settings are missing"));
        }
        (StorageBackend::Memory, _) => {
            log::warn!("Using the in-memory store; data is lost on shutdown");
            AppState::from_config(Arc::new(InMemoryStore::new()), &config)
        }
    };
    let state = web::Data::new(state);

    log::info!(
        "Starting server at {} (access mode: {:?}, ownership enforced: {})",
        config.server_url(),
        config.access_mode,
        config.enforce_ownership
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(TokenMiddleware)
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
