use super::ConfigStore;
use crate::errors::{AdminError, Result};
use crate::model::{Configuration, StoredDocument};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Versioned JSON document on local disk, rewritten atomically
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn ensure_parent(&self) -> Result<()> {
        let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        match fs::metadata(parent).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(AdminError::NotFound(format!(
                "config directory {} does not exist",
                parent.display()
            ))),
        }
    }
}

#[async_trait]
impl ConfigStore for FileStore {
    async fn load(&self) -> Result<Option<Configuration>> {
        self.ensure_parent().await?;

        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AdminError::Persistence(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let document: StoredDocument = serde_json::from_str(&raw).map_err(|e| {
            AdminError::Persistence(format!("corrupt config file {}: {}", self.path.display(), e))
        })?;

        document.into_config().map(Some)
    }

    async fn save(&self, config: &Configuration) -> Result<()> {
        self.ensure_parent().await?;

        let document = StoredDocument::new(config.clone());
        let body = serde_json::to_vec_pretty(&document)?;
        let tmp = self.path.with_extension("json.tmp");

        let write = async {
            fs::write(&tmp, &body).await?;
            fs::rename(&tmp, &self.path).await
        };
        write.await.map_err(|e| {
            AdminError::Persistence(format!("cannot write {}: {}", self.path.display(), e))
        })?;

        debug!("Wrote {} bytes to {}", body.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file ({})", self.path.display())
    }
}
