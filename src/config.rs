// config.rs
// Layered settings: defaults, optional `configuration.*` file, then APP_* env vars.

use std::env;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::messages::Lang;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub log_level: String,
    pub log_json: bool,
    pub users_file: String,
    pub default_language: Lang,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .set_default("port", 8080)?
            .set_default("mongodb_uri", "mongodb://localhost:27017")?
            .set_default("mongodb_db", "fieldsales")?
            .set_default("log_level", "info")?
            .set_default("log_json", false)?
            .set_default("users_file", "./data/users.json")?
            .set_default("default_language", "en")?
            .add_source(File::with_name("configuration").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // plain MONGODB_URI / MONGODB_DB / USERS_FILE win over everything above
            .set_override_option("mongodb_uri", env::var("MONGODB_URI").ok())?
            .set_override_option("mongodb_db", env::var("MONGODB_DB").ok())?
            .set_override_option("users_file", env::var("USERS_FILE").ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
