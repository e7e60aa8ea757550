use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Invalid path component: {0}")]
    InvalidPathComponent(String),
}

pub type FileStorageResult<T> = Result<T, FileStorageError>;

/// Stores attachment contents; the database only keeps relative paths.
#[async_trait]
pub trait FileStorageService: Send + Sync {
    /// Save file data, returning the relative path and size in bytes.
    async fn save_file(
        &self,
        data: Vec<u8>,
        related_type: &str,
        suggested_filename: &str,
    ) -> FileStorageResult<(String, u64)>;

    /// Delete a file; a file that is already gone is not an error.
    async fn delete_file(&self, relative_path: &str) -> FileStorageResult<()>;

    async fn get_file_data(&self, relative_path: &str) -> FileStorageResult<Vec<u8>>;

    fn get_absolute_path(&self, relative_path: &str) -> PathBuf;
}

// --- Local File Storage Implementation ---

pub struct LocalFileStorageService {
    base_path: PathBuf,
    attachments_subdir: String,
}

impl LocalFileStorageService {
    /// Creates the service, making sure the attachments directory exists.
    pub fn new(base_path_str: &str) -> io::Result<Self> {
        let base_path = PathBuf::from(base_path_str);
        let attachments_subdir = "attachments".to_string();

        std::fs::create_dir_all(base_path.join(&attachments_subdir))?;

        Ok(Self {
            base_path,
            attachments_subdir,
        })
    }

    /// Rejects components that could escape the storage root.
    fn sanitize_component(component: &str) -> Result<String, FileStorageError> {
        if component.is_empty() || component.contains('/') || component.contains('\\') || component == "." || component == ".." {
            Err(FileStorageError::InvalidPathComponent(component.to_string()))
        } else {
            Ok(component.to_string())
        }
    }

    /// `<uuid>.<ext>`, keeping the extension of the suggested name.
    fn generate_unique_filename(suggested_filename: &str) -> String {
        let extension = Path::new(suggested_filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        format!("{}{}", Uuid::new_v4(), extension)
    }

    /// Rejects relative paths with `..`, roots or prefixes instead of rewriting them.
    fn checked_absolute_path(&self, relative_path: &str) -> FileStorageResult<PathBuf> {
        let escapes_root = Path::new(relative_path)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes_root {
            return Err(FileStorageError::PermissionDenied(format!(
                "Path outside storage root: {}",
                relative_path
            )));
        }

        let absolute_path = self.get_absolute_path(relative_path);
        if !absolute_path.starts_with(&self.base_path) {
            return Err(FileStorageError::PermissionDenied(format!(
                "Path outside storage root: {}",
                relative_path
            )));
        }
        Ok(absolute_path)
    }
}

#[async_trait]
impl FileStorageService for LocalFileStorageService {
    async fn save_file(
        &self,
        data: Vec<u8>,
        related_type: &str,
        suggested_filename: &str,
    ) -> FileStorageResult<(String, u64)> {
        let sanitized_type = Self::sanitize_component(related_type)?;
        let unique_filename = Self::generate_unique_filename(suggested_filename);

        // attachments/<related_type>/<uuid>.<ext>
        let relative_path = Path::new(&self.attachments_subdir)
            .join(&sanitized_type)
            .join(&unique_filename);
        let relative_path_str = relative_path
            .to_str()
            .ok_or_else(|| FileStorageError::InvalidPathComponent(unique_filename.clone()))?
            .to_string();

        let absolute_path = self.checked_absolute_path(&relative_path_str)?;
        if let Some(parent_dir) = absolute_path.parent() {
            fs::create_dir_all(parent_dir).await?;
        }

        let file_size = data.len() as u64;
        fs::write(&absolute_path, data).await?;

        Ok((relative_path_str, file_size))
    }

    async fn delete_file(&self, relative_path: &str) -> FileStorageResult<()> {
        let absolute_path = self.checked_absolute_path(relative_path)?;

        match fs::remove_file(&absolute_path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FileStorageError::Io(e)),
        }
    }

    async fn get_file_data(&self, relative_path: &str) -> FileStorageResult<Vec<u8>> {
        let absolute_path = self.checked_absolute_path(relative_path)?;

        match fs::read(&absolute_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FileStorageError::NotFound(relative_path.to_string()))
            }
            Err(e) => Err(FileStorageError::Io(e)),
        }
    }

    fn get_absolute_path(&self, relative_path: &str) -> PathBuf {
        // Only normal components survive; "..", roots and prefixes are dropped.
        let mut abs_path = self.base_path.clone();
        for component in Path::new(relative_path).components() {
            if let Component::Normal(part) = component {
                abs_path.push(part);
            }
        }
        abs_path
    }
}
