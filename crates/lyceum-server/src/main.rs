//! Lyceum Server — application entry point.

use std::env;

use lyceum_db::{DbConfig, DbManager};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn db_config_from_env() -> DbConfig {
    let defaults = DbConfig::default();
    DbConfig {
        url: env_or("LYCEUM_DB_URL", &defaults.url),
        namespace: env_or("LYCEUM_DB_NAMESPACE", &defaults.namespace),
        database: env_or("LYCEUM_DB_DATABASE", &defaults.database),
        username: env_or("LYCEUM_DB_USERNAME", &defaults.username),
        password: env_or("LYCEUM_DB_PASSWORD", &defaults.password),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lyceum=info".parse().unwrap()))
        .json()
        .init();

    tracing::info!("Starting Lyceum server...");

    let config = db_config_from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(err) => {
            tracing::error!(error = %err, "failed to connect to the database");
            std::process::exit(1);
        }
    };

    if let Err(err) = lyceum_db::run_migrations(manager.db()).await {
        tracing::error!(error = %err, "failed to run migrations");
        std::process::exit(1);
    }

    // TODO: mount the HTTP gateway once the transport crate lands.

    tracing::info!("Lyceum server stopped.");
}
