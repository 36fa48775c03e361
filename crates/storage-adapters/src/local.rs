//! # Local file storage
//!
//! Case files on disk under a configured root, laid out as
//! `casefiles/<case>/[requester/]<name>`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use domains::{DomainError, FileStorage, Id, Result, StoredFile, UserId};

use crate::upload::{self, UploadPolicy};

pub struct LocalFileStorage {
    /// Root directory for all case files (e.g., "./data")
    root: PathBuf,
    policy: UploadPolicy,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, policy: UploadPolicy) -> Self {
        Self { root: root.into(), policy }
    }

    /// Resolves a stored location under the root, refusing anything that
    /// could escape it.
    fn resolve(&self, location: &str) -> Result<PathBuf> {
        let relative = Path::new(location);
        let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe || location.is_empty() {
            return Err(DomainError::Validation(format!("'{location}' is not a valid file location")));
        }
        Ok(self.root.join(relative))
    }
}

fn io_err(err: std::io::Error) -> DomainError {
    tracing::error!(error = %err, "file storage error");
    DomainError::Internal(format!("file storage: {err}"))
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(
        &self,
        case: Id,
        uploader: Option<UserId>,
        filename: &str,
        data: Bytes,
    ) -> Result<StoredFile> {
        let name = self.policy.check(filename, data.len() as u64)?;
        let location = upload::case_file_location(case, uploader, &name);
        let path = self.resolve(&location)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        // create_new so two uploads of the same name cannot overwrite each other.
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(DomainError::Conflict(format!("{location} already exists")));
            }
            Err(err) => return Err(io_err(err)),
        };
        let written = match file.write_all(&data).await {
            Ok(()) => file.flush().await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            drop(file);
            if let Err(cleanup) = fs::remove_file(&path).await {
                tracing::warn!(%location, error = %cleanup, "partial case file left on disk");
            }
            return Err(io_err(err));
        }

        tracing::info!(case, %location, size = data.len(), "case file stored");
        Ok(StoredFile { content_type: upload::content_type(&name), location, size: data.len() as u64 })
    }

    async fn open(&self, location: &str) -> Result<Bytes> {
        let path = self.resolve(location)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(DomainError::not_found("file", location)),
            Err(err) => Err(io_err(err)),
        }
    }

    async fn remove(&self, location: &str) -> Result<()> {
        let path = self.resolve(location)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(%location, "case file removed");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(err)),
        }
    }
}
