use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::models::FullSnapshot;
use crate::utils::error::{AppError, Result};

/// Durable home of the last fetched [`FullSnapshot`], stored as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous snapshot. No file yet means an empty snapshot.
    pub async fn load(&self) -> Result<FullSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No snapshot at {}, starting fresh", self.path.display());
                return Ok(FullSnapshot::new());
            }
            Err(source) => {
                return Err(AppError::Persistence {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let snapshot: FullSnapshot = serde_json::from_slice(&bytes)?;
        tracing::debug!("Loaded snapshot with {} vendors from {}", snapshot.len(), self.path.display());
        Ok(snapshot)
    }

    /// Replace the stored snapshot. The data goes to a sibling temp file first and is
    /// renamed into place, so the old snapshot survives a crash mid-write.
    pub async fn save(&self, snapshot: &FullSnapshot) -> Result<()> {
        let mut json = serde_json::to_vec_pretty(snapshot)?;
        json.push(b'\n');

        let temp_path = self.temp_path();
        self.write_temp(&temp_path, &json)
            .await
            .map_err(|source| AppError::Persistence {
                path: temp_path.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(AppError::Persistence {
                path: self.path.clone(),
                source,
            });
        }

        tracing::debug!("Saved snapshot to {}", self.path.display());
        Ok(())
    }

    async fn write_temp(&self, temp_path: &Path, data: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = temp_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::File::create(temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
