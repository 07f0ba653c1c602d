use crate::db::connection::{init_db, Database};
use crate::listing_source::{ApifyClient, FileSource, ListingSource};
use crate::responses::error_response;
use crate::router::{handle, App};
use astra::Server;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cleaning;
mod config;
mod db;
mod domain;
mod errors;
mod listing_source;
mod responses;
mod router;
mod runner;
mod spreadsheets;
mod templates;

#[cfg(test)]
mod tests;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Database handle, schema applied on every start
    let db = Database::new(env_or("DB_PATH", "listing_quality.sqlite3"));
    if let Err(e) = init_db(&db) {
        error!("Database initialization failed: {e}");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(env_or("CONFIG_PATH", "config.json"));

    // A saved dataset replaces the scraper for offline runs.
    let source: Arc<dyn ListingSource> = match std::env::var("LISTINGS_FILE") {
        Ok(path) => {
            info!("Reading listings from {path}");
            Arc::new(FileSource::new(path))
        }
        Err(_) => match ApifyClient::from_env() {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!("Listing source unavailable: {e}");
                std::process::exit(1);
            }
        },
    };

    let bind = env_or("BIND_ADDR", "127.0.0.1:3000");
    let addr: SocketAddr = match bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid BIND_ADDR {bind}: {e}");
            std::process::exit(1);
        }
    };
    info!("Starting server at http://{addr}");

    let app = App {
        db,
        source,
        config_path,
    };
    let server = Server::bind(&addr).max_workers(8);

    let result = server.serve(move |req, _info| match handle(req, &app) {
        Ok(resp) => resp,
        Err(err) => error_response(err),
    });

    if let Err(e) = result {
        error!("Server ended with error: {e}");
    }

    info!("Server shut down cleanly.");
}
