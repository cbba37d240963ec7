//! Storage for user-submitted sunset photos.
//!
//! Files land in a flat directory under a sanitized name; there is no index
//! or metadata store.

use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::error::UploadError;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and write a photo, returning the stored file name.
    pub async fn save(
        &self,
        location: &str,
        date: &str,
        filename: &str,
        contents: &[u8],
    ) -> Result<String, UploadError> {
        if filename.is_empty() {
            return Err(UploadError::NoSelectedFile);
        }
        if !allowed_file(filename) {
            return Err(UploadError::InvalidFileType);
        }

        let stored = secure_filename(&format!("{date}_{location}_{filename}"));
        if !allowed_file(&stored) {
            return Err(UploadError::InvalidFileType);
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&stored), contents).await?;

        tracing::info!(file = %stored, bytes = contents.len(), "stored photo");
        Ok(stored)
    }
}

/// Whether `filename` carries one of the [`ALLOWED_EXTENSIONS`].
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Reduce a user-supplied name to something safe to use as a single path
/// component. Accents are folded to ASCII via NFKD, whitespace and separators
/// become `_`, anything outside `[A-Za-z0-9_.-]` is dropped, and leading or
/// trailing `.`/`_` are removed.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
