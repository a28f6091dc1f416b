//! Storage sink for acquired document records.
//!
//! The pipeline only depends on something accepting a finished
//! [`DocumentRecord`]; the shipped implementation appends JSON lines to a
//! file next to the downloads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::models::DocumentRecord;

/// Consumer of finished document records.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Persist one record. `id` uniqueness is the caller's responsibility.
    async fn insert(&self, record: &DocumentRecord) -> anyhow::Result<()>;
}

/// Append-only JSON-lines sink.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSink for JsonlSink {
    async fn insert(&self, record: &DocumentRecord) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
