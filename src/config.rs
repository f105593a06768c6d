use anyhow::{Context, Result};
use sea_orm::Database;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::password::Argon2Hasher;
use crate::schemas::AppState;
use crate::uploads::LocalUploadStore;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://storefront.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Runtime configuration.
///
/// Sources, lowest priority first: built-in defaults, an optional
/// `storefront.{toml,yaml,json}` file in the working directory, then
/// `STOREFRONT_*` environment variables (e.g. `STOREFRONT_UPLOADS_DIR`).
/// Command line flags are applied on top by the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, the optional config file and the
    /// environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("uploads_dir", DEFAULT_UPLOADS_DIR)?
            .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as u64)?
            .add_source(config::File::with_name("storefront").required(false))
            .add_source(config::Environment::with_prefix("STOREFRONT"))
            .build()
            .context("read configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("parse configuration")?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Apply command line overrides.
    pub fn with_overrides(
        mut self,
        database_url: Option<String>,
        bind_address: Option<String>,
        uploads_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        if let Some(uploads_dir) = uploads_dir {
            self.uploads_dir = uploads_dir;
        }
        self
    }
}

/// Initialize application state: connect to the database and wire the
/// password hasher and upload store.
pub async fn initialize_app_state(config: AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url)
        .await
        .with_context(|| format!("connect to database {}", config.database_url))?;

    let uploads = LocalUploadStore::new(config.uploads_dir.clone());
    debug!("Uploads directory: {}", uploads.dir().display());

    Ok(AppState {
        db,
        config: Arc::new(config),
        hasher: Arc::new(Argon2Hasher),
        uploads: Arc::new(uploads),
    })
}
