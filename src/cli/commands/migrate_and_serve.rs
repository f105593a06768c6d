use anyhow::{Context, Result};
use sea_orm::Database;
use tracing::{debug, info, trace};

use super::initdb::apply_migrations;
use super::serve::serve;
use crate::config::AppConfig;

pub async fn migrate_and_serve(config: AppConfig) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", config.database_url);

    // The migration connection is closed before the server opens its own pool
    {
        let db = Database::connect(&config.database_url)
            .await
            .with_context(|| format!("connect to database '{}'", config.database_url))?;
        apply_migrations(&db).await?;
    }

    serve(config).await
}
