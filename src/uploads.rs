use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Stores uploaded files and hands back the generated file name.
#[async_trait]
pub trait UploadStore: Send + Sync + std::fmt::Debug {
    async fn store(&self, original_name: &str, body: Bytes) -> anyhow::Result<String>;
}

/// Writes uploads into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalUploadStore {
    dir: PathBuf,
}

impl LocalUploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl UploadStore for LocalUploadStore {
    async fn store(&self, original_name: &str, body: Bytes) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create uploads dir {}", self.dir.display()))?;

        let filename = unique_filename(original_name);
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;

        debug!("Stored {} bytes as {}", body.len(), path.display());
        Ok(filename)
    }
}

/// Random file name keeping the client's extension, if it had one.
pub fn unique_filename(original_name: &str) -> String {
    let id = Uuid::new_v4().simple();
    match client_extension(original_name) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

fn client_extension(original_name: &str) -> Option<String> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}
