//! Content service
//!
//! Upload, shorten, resolve and stats on top of the metadata store and the
//! blob store. The two stores never share a transaction; ordering is what
//! keeps them consistent:
//!
//! - blob first, record second, so a crash leaves at most an orphan blob
//! - a collision on the record moves the blob to a fresh identifier instead
//!   of rewriting it, because the upload stream can only be read once

use std::sync::Arc;

use chrono::Duration;
use tokio::fs::File;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};

use crate::config::StaticConfig;
use crate::errors::{EphemeraError, Result};
use crate::storage::{BlobStore, ContentStats, FileRecord, SeaOrmStorage, UrlRecord};
use crate::utils::url_validator::validate_url;
use crate::utils::{Clock, IdentifierSource, file_extension, validate_identifier};

/// Fallback when the display name has no recognised extension
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Tunables the service needs, extracted from [`StaticConfig`]
#[derive(Debug, Clone)]
pub struct ContentSettings {
    /// Identifier attempts per operation, first try included
    pub max_attempts: u32,
    pub max_upload_bytes: Option<u64>,
    pub file_ttl: Duration,
    pub url_ttl: Duration,
    pub long_ttl: Duration,
}

impl ContentSettings {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            max_attempts: config.storage.max_identifier_attempts.max(1),
            max_upload_bytes: Some(config.storage.max_upload_bytes),
            file_ttl: secs(config.expiry.file_ttl_secs),
            url_ttl: secs(config.expiry.url_ttl_secs),
            long_ttl: secs(config.expiry.long_ttl_secs),
        }
    }
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self::from_config(&StaticConfig::default())
    }
}

fn secs(value: u64) -> Duration {
    let value = value.min(crate::config::MAX_TTL_SECS);
    Duration::try_seconds(value as i64).unwrap_or(Duration::zero())
}

/// A freshly created item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    pub identifier: String,
    /// Path relative to the public base, e.g. `/aB3dE6gH.txt` or `/s/aB3dE6gH`
    pub public_path: String,
}

/// A live file ready to be streamed to the caller
#[derive(Debug)]
pub struct ResolvedFile {
    pub display_name: String,
    pub content_type: String,
    pub file: File,
    pub len: u64,
}

pub struct ContentService {
    storage: Arc<SeaOrmStorage>,
    blobs: Arc<BlobStore>,
    ids: Arc<dyn IdentifierSource>,
    clock: Arc<dyn Clock>,
    settings: ContentSettings,
}

impl ContentService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        blobs: Arc<BlobStore>,
        ids: Arc<dyn IdentifierSource>,
        clock: Arc<dyn Clock>,
        settings: ContentSettings,
    ) -> Self {
        Self {
            storage,
            blobs,
            ids,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &ContentSettings {
        &self.settings
    }

    fn next_identifier(&self, suffix: &str) -> Result<String> {
        let identifier = format!("{}{}", self.ids.generate(), suffix);
        if validate_identifier(&identifier) {
            Ok(identifier)
        } else {
            Err(EphemeraError::storage(format!(
                "identifier source produced an unusable identifier '{}'",
                identifier
            )))
        }
    }

    fn exhausted(&self, what: &str) -> EphemeraError {
        error!(
            "Identifier retries exhausted for {} after {} attempts",
            what, self.settings.max_attempts
        );
        EphemeraError::exhausted_retries(format!(
            "could not allocate a unique identifier for {} after {} attempts",
            what, self.settings.max_attempts
        ))
    }

    // ============ Upload ============

    /// Stores an uploaded file and records it with the file or long TTL.
    pub async fn upload<R>(&self, filename: &str, reader: R, long: bool) -> Result<StoredContent>
    where
        R: AsyncRead + Unpin,
    {
        if filename.trim().is_empty() {
            return Err(EphemeraError::invalid_input("filename must not be empty"));
        }

        let extension = file_extension(filename);
        let max_attempts = self.settings.max_attempts;
        let mut reader = reader;
        let mut attempt = 0u32;

        // 1. 写入 blob；create_new 冲突时在读取任何字节前返回
        let (mut identifier, size) = loop {
            if attempt >= max_attempts {
                return Err(self.exhausted("upload"));
            }
            attempt += 1;

            let candidate = self.next_identifier(&extension)?;
            match self
                .blobs
                .write(&candidate, &mut reader, self.settings.max_upload_bytes)
                .await
            {
                Ok(size) => break (candidate, size),
                Err(e) if e.is_duplicate_key() => {
                    debug!("Blob identifier collision on '{}', regenerating", candidate);
                }
                Err(e) => return Err(e),
            }
        };

        // 2. 插入记录；主键冲突时把 blob 挪到新标识符
        let ttl = if long {
            self.settings.long_ttl
        } else {
            self.settings.file_ttl
        };
        let expires_at = self.clock.now() + ttl;

        loop {
            let record = FileRecord {
                identifier: identifier.clone(),
                display_name: filename.to_string(),
                expires_at,
            };

            match self.storage.insert_file(&record).await {
                Ok(()) => break,
                Err(e) if e.is_duplicate_key() => {
                    debug!("File record collision on '{}', relocating blob", identifier);
                    identifier = self.relocate_blob(&identifier, &extension, &mut attempt).await?;
                }
                Err(e) => {
                    self.discard_blob(&identifier).await;
                    return Err(e);
                }
            }
        }

        info!(
            "Uploaded '{}' as {} ({} bytes, long={})",
            filename, identifier, size, long
        );
        Ok(StoredContent {
            public_path: format!("/{}", identifier),
            identifier,
        })
    }

    /// Moves the blob at `current` to a fresh identifier, consuming attempts.
    async fn relocate_blob(
        &self,
        current: &str,
        extension: &str,
        attempt: &mut u32,
    ) -> Result<String> {
        loop {
            if *attempt >= self.settings.max_attempts {
                self.discard_blob(current).await;
                return Err(self.exhausted("upload"));
            }
            *attempt += 1;

            let candidate = match self.next_identifier(extension) {
                Ok(candidate) => candidate,
                Err(e) => {
                    self.discard_blob(current).await;
                    return Err(e);
                }
            };
            match self.blobs.relocate(current, &candidate).await {
                Ok(()) => return Ok(candidate),
                Err(e) if e.is_duplicate_key() => {
                    debug!("Relocation target '{}' taken, regenerating", candidate);
                }
                Err(e) => {
                    self.discard_blob(current).await;
                    return Err(e);
                }
            }
        }
    }

    async fn discard_blob(&self, identifier: &str) {
        if let Err(e) = self.blobs.remove(identifier).await {
            warn!("Failed to discard blob '{}': {}", identifier, e);
        }
    }

    // ============ Shorten ============

    /// Records a short URL with the URL or long TTL.
    pub async fn shorten(&self, target: &str, long: bool) -> Result<StoredContent> {
        let target = validate_url(target)
            .map_err(|e| EphemeraError::invalid_input(e.to_string()))?
            .to_string();

        let ttl = if long {
            self.settings.long_ttl
        } else {
            self.settings.url_ttl
        };
        let expires_at = self.clock.now() + ttl;

        for _ in 0..self.settings.max_attempts {
            let record = UrlRecord {
                identifier: self.next_identifier("")?,
                target_url: target.clone(),
                expires_at,
            };

            match self.storage.insert_url(&record).await {
                Ok(()) => {
                    return Ok(StoredContent {
                        public_path: format!("/s/{}", record.identifier),
                        identifier: record.identifier,
                    });
                }
                Err(e) if e.is_duplicate_key() => {
                    debug!("URL record collision on '{}', regenerating", record.identifier);
                }
                Err(e) => return Err(e),
            }
        }

        Err(self.exhausted("short URL"))
    }

    // ============ Resolve ============

    /// Opens a live file. Invalid, absent, expired and blob-less identifiers
    /// all come back as the same `NotFound`.
    pub async fn resolve_file(&self, identifier: &str) -> Result<ResolvedFile> {
        if !validate_identifier(identifier) {
            debug!("Rejected malformed file identifier");
            return Err(not_found(identifier));
        }

        let Some(record) = self.storage.get_file(identifier).await? else {
            debug!("File not found: {}", identifier);
            return Err(not_found(identifier));
        };

        if !record.is_live(self.clock.now()) {
            debug!("File expired: {} (at {})", identifier, record.expires_at);
            return Err(not_found(identifier));
        }

        let Some(handle) = self.blobs.open(identifier).await? else {
            warn!("Live file record without blob: {}", identifier);
            return Err(not_found(identifier));
        };

        let content_type = mime_guess::from_path(&record.display_name)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Ok(ResolvedFile {
            display_name: record.display_name,
            content_type,
            file: handle.file,
            len: handle.len,
        })
    }

    /// Looks up the target of a live short URL.
    pub async fn resolve_url(&self, identifier: &str) -> Result<String> {
        if !validate_identifier(identifier) {
            return Err(not_found(identifier));
        }

        let Some(record) = self.storage.get_url(identifier).await? else {
            debug!("Short URL not found: {}", identifier);
            return Err(not_found(identifier));
        };

        if !record.is_live(self.clock.now()) {
            debug!("Short URL expired: {} (at {})", identifier, record.expires_at);
            return Err(not_found(identifier));
        }

        Ok(record.target_url)
    }

    // ============ Stats ============

    /// Row counts of both collections. Expired rows the sweeper has not yet
    /// removed are still counted.
    pub async fn stats(&self) -> Result<ContentStats> {
        let (files, urls) = tokio::try_join!(self.storage.count_files(), self.storage.count_urls())?;
        Ok(ContentStats { files, urls })
    }
}

fn not_found(identifier: &str) -> EphemeraError {
    let shown: String = identifier.chars().take(64).collect();
    EphemeraError::not_found(format!("'{}' not found", shown.escape_debug()))
}
