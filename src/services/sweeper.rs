//! 过期内容回收
//!
//! 每个周期：列出过期文件 → 逐个删除 blob → 批量删除文件记录 → 批量删除短链接记录。
//! 任何失败只记日志，循环本身永不退出（除非取消）。

use std::sync::Arc;
use std::time::{Duration as StdDuration, SystemTime};

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ExpiryConfig, MAX_TTL_SECS};
use crate::storage::{BlobStore, SeaOrmStorage};
use crate::utils::{Clock, validate_identifier};

/// 单次回收结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// 删除的文件记录数量
    pub files_deleted: u64,
    /// 实际删除的 blob 数量
    pub blobs_removed: u64,
    /// 删除失败的 blob 数量（记录仍会被删除）
    pub blob_failures: u64,
    /// 删除的短链接记录数量
    pub urls_deleted: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.files_deleted == 0
            && self.blobs_removed == 0
            && self.blob_failures == 0
            && self.urls_deleted == 0
    }
}

/// 回收任务
pub struct Sweeper {
    storage: Arc<SeaOrmStorage>,
    blobs: Arc<BlobStore>,
    clock: Arc<dyn Clock>,
    interval: StdDuration,
    orphan_grace: Duration,
}

impl Sweeper {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        blobs: Arc<BlobStore>,
        clock: Arc<dyn Clock>,
        expiry: &ExpiryConfig,
    ) -> Self {
        Self {
            storage,
            blobs,
            clock,
            interval: StdDuration::from_secs(expiry.sweep_interval_secs.max(1)),
            orphan_grace: Duration::try_seconds(expiry.orphan_grace_secs.min(MAX_TTL_SECS) as i64)
                .unwrap_or(Duration::zero()),
        }
    }

    pub fn interval(&self) -> StdDuration {
        self.interval
    }

    /// Overrides the sweep interval (sub-second intervals are allowed here)
    pub fn with_interval(mut self, interval: StdDuration) -> Self {
        self.interval = interval;
        self
    }

    async fn written_after(&self, identifier: &str, expires_at: DateTime<Utc>) -> bool {
        match self.blobs.modified(identifier).await {
            Ok(Some(modified)) => modified > SystemTime::from(expires_at),
            // 不存在或无法 stat 时交给 remove 处理
            _ => false,
        }
    }

    /// 执行一次回收
    ///
    /// 所有步骤使用同一个截止时间，保证删除的 blob 与删除的记录是同一批。
    ///
    /// A blob modified after its row's `expires_at` cannot belong to that row:
    /// an upload reused the identifier after the row's own blob was already
    /// gone. Such blobs are kept; the new upload either inserts its record once
    /// the stale row is deleted, or relocates on the duplicate key.
    pub async fn run_once(&self) -> SweepReport {
        let cutoff = self.clock.now();
        let mut report = SweepReport::default();

        // 1. 先删 blob，再删记录：中途失败最多留下指向空 blob 的过期记录
        match self.storage.list_expired_files(cutoff).await {
            Ok(expired) => {
                for (identifier, expires_at) in expired {
                    if !validate_identifier(&identifier) {
                        warn!("Skipping blob removal for malformed identifier {:?}", identifier);
                        report.blob_failures += 1;
                        continue;
                    }
                    if self.written_after(&identifier, expires_at).await {
                        debug!(
                            "Blob '{}' is newer than its expired record, leaving it",
                            identifier
                        );
                        continue;
                    }
                    match self.blobs.remove(&identifier).await {
                        Ok(true) => report.blobs_removed += 1,
                        Ok(false) => debug!("Expired blob already gone: {}", identifier),
                        Err(e) => {
                            warn!("Failed to remove expired blob '{}': {}", identifier, e);
                            report.blob_failures += 1;
                        }
                    }
                }

                // 2. 批量删除文件记录
                match self.storage.delete_expired_files(cutoff).await {
                    Ok(deleted) => report.files_deleted = deleted,
                    Err(e) => error!("Failed to delete expired file records: {}", e),
                }
            }
            Err(e) => {
                error!("Failed to list expired files: {}", e);
            }
        }

        // 3. 短链接记录与文件无关，始终执行
        match self.storage.delete_expired_urls(cutoff).await {
            Ok(deleted) => report.urls_deleted = deleted,
            Err(e) => error!("Failed to delete expired url records: {}", e),
        }

        if report.is_empty() {
            debug!("Sweep found nothing to reclaim");
        } else {
            info!(
                "Sweep completed: files {}, blobs {}, blob failures {}, urls {}",
                report.files_deleted, report.blobs_removed, report.blob_failures, report.urls_deleted
            );
        }

        report
    }

    /// 删除没有文件记录的 blob
    ///
    /// 只处理修改时间早于 `now - orphan_grace` 的文件，正在上传（blob 已写入、
    /// 记录尚未插入）的内容不会被误删。返回删除数量。
    pub async fn reclaim_orphans(&self) -> u64 {
        let entries = match self.blobs.list().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to scan upload directory: {}", e);
                return 0;
            }
        };

        let threshold = self.clock.now() - self.orphan_grace;
        let mut removed = 0u64;

        for entry in entries {
            if !validate_identifier(&entry.identifier) {
                continue;
            }
            if DateTime::<Utc>::from(entry.modified) > threshold {
                continue;
            }

            match self.storage.get_file(&entry.identifier).await {
                Ok(Some(_)) => {}
                Ok(None) => match self.blobs.remove(&entry.identifier).await {
                    Ok(true) => {
                        debug!("Removed orphan blob: {}", entry.identifier);
                        removed += 1;
                    }
                    Ok(false) => {}
                    Err(e) => warn!("Failed to remove orphan blob '{}': {}", entry.identifier, e),
                },
                Err(e) => {
                    warn!("Orphan check failed for '{}': {}", entry.identifier, e);
                }
            }
        }

        if removed > 0 {
            info!("Reclaimed {} orphan blobs", removed);
        }
        removed
    }

    /// 启动后台回收任务
    ///
    /// 先等待一个周期再执行；取消在休眠期间和两次执行之间生效，
    /// 正在执行的回收会完整跑完。
    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        info!(
            "Sweeper background task started (interval: {}s)",
            self.interval.as_secs()
        );

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }

                self.run_once().await;
            }
            info!("Sweeper stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_is_empty() {
        assert!(SweepReport::default().is_empty());
        let report = SweepReport {
            urls_deleted: 1,
            ..Default::default()
        };
        assert!(!report.is_empty());
    }
}
