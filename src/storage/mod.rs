use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::ScrapeError;
use crate::traits::PageStore;

/// Keeps every fetched page under a data directory
pub struct FilePageStore {
    dir: PathBuf,
}

impl FilePageStore {
    /// # Errors
    ///
    /// Returns [`ScrapeError::Storage`] if the directory cannot be created.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, ScrapeError> {
        let dir = dir.into();

        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            info!("Creating data directory {}", dir.display());
        }
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| ScrapeError::Storage {
                name: dir.display().to_string(),
                source,
            })?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl PageStore for FilePageStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), ScrapeError> {
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| ScrapeError::Storage {
                name: name.to_string(),
                source,
            })?;

        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// Keeps saved pages in memory, in save order
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_names(&self) -> Vec<String> {
        self.pages
            .lock()
            .map(|pages| pages.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Most recent bytes saved under `name`
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        let pages = self.pages.lock().ok()?;
        pages
            .iter()
            .rev()
            .find(|(saved, _)| saved == name)
            .map(|(_, bytes)| bytes.clone())
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), ScrapeError> {
        if let Ok(mut pages) = self.pages.lock() {
            pages.push((name.to_string(), bytes.to_vec()));
        }
        Ok(())
    }
}

/// Deterministic name for a saved page of one city
pub fn page_file_name(city: &str, kind: &str, key: impl std::fmt::Display) -> String {
    let city: String = city
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{city}-{kind}-{key}.html")
}

/// Detail pages are keyed by a hash of their URL
pub fn detail_file_name(city: &str, url: &str) -> String {
    page_file_name(city, "detail", format_args!("{:x}", md5::compute(url)))
}
