//! Filesystem blob store
//!
//! Uploaded bytes live in a single flat directory, one file per identifier.
//! Callers must pass identifiers that already passed
//! [`crate::utils::validate_identifier`]; this module joins them onto the root
//! without further checks.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::errors::{EphemeraError, Result};

/// Directory entry seen by the orphan scan
#[derive(Debug, Clone)]
pub struct BlobEntry {
    pub identifier: String,
    pub modified: SystemTime,
}

/// An opened blob ready to be streamed
#[derive(Debug)]
pub struct BlobHandle {
    pub file: File,
    pub len: u64,
}

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Opens the store, creating the root directory when missing
    pub async fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            EphemeraError::storage(format!(
                "Failed to create upload directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    fn path_for(&self, identifier: &str) -> PathBuf {
        debug_assert!(crate::utils::validate_identifier(identifier));
        self.root.join(identifier)
    }

    /// Streams `reader` into a new blob named `identifier`.
    ///
    /// The file is created exclusively: an existing blob yields `DuplicateKey`
    /// before anything is read from `reader`. When `max_bytes` is exceeded or
    /// the copy fails, the partial file is removed.
    pub async fn write<R>(&self, identifier: &str, reader: R, max_bytes: Option<u64>) -> Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let path = self.path_for(identifier);

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(EphemeraError::duplicate_key(format!(
                    "blob '{}' already exists",
                    identifier
                )));
            }
            Err(e) => {
                return Err(EphemeraError::storage(format!(
                    "Failed to create blob '{}': {}",
                    identifier, e
                )));
            }
        };

        let copied = match max_bytes {
            // 多读 1 字节用于判断是否超限
            Some(limit) => {
                let mut limited = reader.take(limit.saturating_add(1));
                tokio::io::copy(&mut limited, &mut file).await
            }
            None => {
                let mut reader = reader;
                tokio::io::copy(&mut reader, &mut file).await
            }
        };

        let outcome = match copied {
            Ok(n) if max_bytes.is_some_and(|limit| n > limit) => Err(EphemeraError::invalid_input(
                format!(
                    "upload exceeds the maximum size of {} bytes",
                    max_bytes.unwrap_or_default()
                ),
            )),
            Ok(n) => match file.flush().await {
                Ok(()) => file.sync_all().await.map(|_| n).map_err(EphemeraError::from),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(EphemeraError::storage(format!(
                "Failed to write blob '{}': {}",
                identifier, e
            ))),
        };

        if outcome.is_err() {
            drop(file);
            if let Err(e) = fs::remove_file(&path).await {
                warn!("Failed to discard partial blob '{}': {}", identifier, e);
            }
        } else {
            trace!("Blob written: {}", identifier);
        }

        outcome
    }

    /// Opens a blob for reading. A missing blob is `Ok(None)`.
    pub async fn open(&self, identifier: &str) -> Result<Option<BlobHandle>> {
        let path = self.path_for(identifier);
        match File::open(&path).await {
            Ok(file) => {
                let len = file.metadata().await?.len();
                Ok(Some(BlobHandle { file, len }))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EphemeraError::storage(format!(
                "Failed to open blob '{}': {}",
                identifier, e
            ))),
        }
    }

    /// Last modification time of a blob, `Ok(None)` when it does not exist
    pub async fn modified(&self, identifier: &str) -> Result<Option<SystemTime>> {
        match fs::metadata(self.path_for(identifier)).await {
            Ok(metadata) => Ok(Some(metadata.modified()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EphemeraError::storage(format!(
                "Failed to stat blob '{}': {}",
                identifier, e
            ))),
        }
    }

    /// Removes a blob. Returns whether a file was actually deleted; a missing
    /// blob is not an error.
    pub async fn remove(&self, identifier: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(identifier)).await {
            Ok(()) => {
                debug!("Blob removed: {}", identifier);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(EphemeraError::storage(format!(
                "Failed to remove blob '{}': {}",
                identifier, e
            ))),
        }
    }

    /// Renames a blob without ever replacing an existing target.
    ///
    /// Implemented as hard link + unlink, so a taken `to` yields `DuplicateKey`
    /// and leaves `from` untouched.
    pub async fn relocate(&self, from: &str, to: &str) -> Result<()> {
        let src = self.path_for(from);
        let dst = self.path_for(to);

        match fs::hard_link(&src, &dst).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(EphemeraError::duplicate_key(format!(
                    "blob '{}' already exists",
                    to
                )));
            }
            Err(e) => {
                return Err(EphemeraError::storage(format!(
                    "Failed to link blob '{}' -> '{}': {}",
                    from, to, e
                )));
            }
        }

        if let Err(e) = fs::remove_file(&src).await {
            warn!("Failed to unlink relocated blob '{}': {}", from, e);
        }
        Ok(())
    }

    /// Lists regular files in the root directory
    pub async fn list(&self) -> Result<Vec<BlobEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                // 扫描期间被删除
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }
            let Ok(identifier) = entry.file_name().into_string() else {
                continue;
            };
            entries.push(BlobEntry {
                identifier,
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        Ok(entries)
    }
}
