//! File storage under a single root directory

pub mod error;
mod upload;

use upload::is_upload_temp_name;

pub use error::{Result, StorageError};

use std::path::{Path, PathBuf};
use tokio::fs::{self, File};

/// Placeholder payload for an empty listing
pub const EMPTY_LISTING: &str = "(empty)\n";

/// Whether `name` may be used as a stored file name.
///
/// Rejects empty names, path separators, any ".." sequence and NUL bytes.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name.contains('\0')
        && !name.chars().any(std::path::is_separator)
}

/// Render a LIST payload: one name per line, or [`EMPTY_LISTING`]
pub fn render_listing(names: &[String]) -> String {
    if names.is_empty() {
        return EMPTY_LISTING.to_string();
    }

    let mut listing = String::with_capacity(names.iter().map(|n| n.len() + 1).sum());
    for name in names {
        listing.push_str(name);
        listing.push('\n');
    }
    listing
}

/// Handle to the storage root
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Open the storage root, creating it if missing
    pub async fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();

        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", root.display()),
                ));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs::create_dir_all(&root).await?;
                tracing::info!("Created storage directory {}", root.display());
            }
            Err(e) => return Err(e),
        }

        Ok(Self { root })
    }

    /// Storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a stored file; fails for unsafe names
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        if !is_safe_filename(name) {
            return Err(StorageError::InvalidFilename);
        }
        Ok(self.root.join(name))
    }

    /// Open a stored file for download, returning it with its size
    pub async fn open_download(&self, name: &str) -> Result<(File, u64)> {
        let path = self.path_for(name)?;

        let file = File::open(&path).await.map_err(|_| StorageError::NotFound)?;
        let meta = file.metadata().await.map_err(StorageError::Stat)?;
        if !meta.is_file() {
            return Err(StorageError::NotRegularFile);
        }

        Ok((file, meta.len()))
    }

    /// Names of stored files.
    ///
    /// Order is whatever the directory enumeration yields. Entries with
    /// unsafe or non-UTF-8 names are skipped, as are the temporary files of
    /// uploads still in progress.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut dir = fs::read_dir(&self.root).await.map_err(StorageError::ReadDir)?;
        let mut names = Vec::new();

        while let Some(entry) = dir.next_entry().await.map_err(StorageError::ReadDir)? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name == "." || name == ".." || !is_safe_filename(&name) || is_upload_temp_name(&name) {
                continue;
            }
            names.push(name);
        }

        Ok(names)
    }
}
