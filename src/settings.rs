use std::env;

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Postgres {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub port: u16,
    pub environment: String,
}

#[derive(Debug, Deserialize)]
pub struct Smtp {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Deserialize)]
pub struct Frontend {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub postgres: Postgres,
    pub server: Server,
    pub smtp: Smtp,
    pub frontend: Frontend,
}

// Environment variables recognized by the original deployment; each one
// overrides the matching config.toml key.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("postgres.url", "DATABASE_URL"),
    ("server.port", "PORT"),
    ("server.environment", "NODE_ENV"),
    ("smtp.host", "SMTP_HOST"),
    ("smtp.port", "SMTP_PORT"),
    ("smtp.user", "SMTP_USER"),
    ("smtp.pass", "SMTP_PASS"),
    ("frontend.url", "FRONTEND_URL"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 5000)?
            .set_default("server.environment", "development")?
            .set_default("smtp.host", "localhost")?
            .set_default("smtp.port", 587)?
            .set_default("smtp.user", "")?
            .set_default("smtp.pass", "")?
            .set_default("frontend.url", "http://localhost:3000")?
            .add_source(File::with_name("config.toml").required(false));

        for (key, var) in ENV_OVERRIDES {
            if let Ok(value) = env::var(var) {
                builder = builder.set_override(*key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }
}
