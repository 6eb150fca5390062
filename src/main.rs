use std::fs;
use std::path::Path;

use sqlx::postgres::PgPoolOptions;

mod models;
mod repositories;
pub mod services;
pub mod settings;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_logging("log4rs.yaml").expect("Could not initialize logging.");

    let config = settings::Settings::new().expect("Could not load config file.");
    let conn = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.postgres.url)
        .await
        .expect("Could not connect to database.");

    log::info!("Starting referral API.");
    services::start_services(conn, config)
        .await
        .expect("Could not start services.");
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    log4rs::init_file(path, Default::default())
        .map_err(|e| anyhow::anyhow!("Could not initialize logging: {}", e))
}
