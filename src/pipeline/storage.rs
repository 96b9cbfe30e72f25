//! Output storage: write generated images to disk and mint public URLs.
//!
//! Files land in the configured output directory under
//! `{stem}_{uuid}.{ext}`, so concurrent requests sharing one directory
//! never collide and a failed pipeline leaves its already-written pages
//! on disk (partial results are not rolled back). Writes go through a
//! temp file and rename so a crash never leaves a half-written image
//! behind a live URL.

use crate::client::GeneratedImage;
use crate::error::WedcardError;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Where images go and how their URLs are minted.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    public_base_url: String,
}

/// A stored image: its filesystem path and public URL.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub path: PathBuf,
    pub url: String,
}

impl ImageStore {
    /// The URL prefix the server mounts the output directory under.
    pub const MOUNT: &'static str = "/static/generated";

    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `image` under a fresh `{stem}_{uuid}.{ext}` name.
    pub async fn save(
        &self,
        image: &GeneratedImage,
        stem: &str,
    ) -> Result<StoredImage, WedcardError> {
        let filename = format!("{stem}_{}.{}", Uuid::new_v4(), image.extension());
        let path = self.dir.join(&filename);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| WedcardError::StorageFailed {
                path: self.dir.clone(),
                source: e,
            })?;

        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &image.data)
            .await
            .map_err(|e| WedcardError::StorageFailed {
                path: path.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| WedcardError::StorageFailed {
                path: path.clone(),
                source: e,
            })?;

        let url = format!("{}{}/{filename}", self.public_base_url, Self::MOUNT);
        debug!(path = %path.display(), %url, "stored generated image");
        Ok(StoredImage { path, url })
    }
}
