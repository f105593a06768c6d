#[cfg(test)]
pub mod test_utils {
    use crate::config::AppConfig;
    use crate::password::Argon2Hasher;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use crate::uploads::{LocalUploadStore, UploadStore};
    use axum::Router;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tracing::subscriber::DefaultGuard;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Keeps the uploads directory and the test log subscriber alive for the
    /// duration of a test.
    pub struct TestGuard {
        uploads_dir: TempDir,
        _tracing: DefaultGuard,
    }

    impl TestGuard {
        pub fn uploads_path(&self) -> &Path {
            self.uploads_dir.path()
        }
    }

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing. Uploads land in the returned directory,
    /// which is removed when dropped.
    pub async fn setup_test_app_state() -> (AppState, TempDir) {
        let db = setup_test_db().await;
        let uploads_dir = TempDir::new().expect("Failed to create uploads directory");

        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            uploads_dir: uploads_dir.path().to_path_buf(),
            ..AppConfig::default()
        };

        let state = AppState {
            db,
            hasher: Arc::new(Argon2Hasher),
            uploads: Arc::new(LocalUploadStore::new(config.uploads_dir.clone())),
            config: Arc::new(config),
        };
        (state, uploads_dir)
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level comes from RUST_LOG and defaults to WARN.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| level.parse::<Level>().ok())
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing, together with the state it was built
    /// from and the guard owning the uploads directory and log subscriber.
    pub async fn setup_test_app() -> (Router, AppState, TestGuard) {
        let tracing = init_test_tracing();

        let (state, uploads_dir) = setup_test_app_state().await;
        let router = create_router(state.clone());
        let guard = TestGuard {
            uploads_dir,
            _tracing: tracing,
        };
        (router, state, guard)
    }

    /// Same as [`setup_test_app`] but with `uploads` replacing the local
    /// upload store.
    pub async fn setup_test_app_with_uploads(
        uploads: Arc<dyn UploadStore>,
    ) -> (Router, AppState, TestGuard) {
        let tracing = init_test_tracing();

        let (mut state, uploads_dir) = setup_test_app_state().await;
        state.uploads = uploads;
        let router = create_router(state.clone());
        let guard = TestGuard {
            uploads_dir,
            _tracing: tracing,
        };
        (router, state, guard)
    }
}
