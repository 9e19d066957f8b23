//! Mutation operations for SeaOrmStorage
//!
//! Records are insert-only; the only deletions are the bulk expiry deletes
//! issued by the sweeper.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::{file_record_to_active_model, url_record_to_active_model};
use super::retry;
use crate::errors::Result;
use crate::storage::{FileRecord, UrlRecord};

use migration::entities::{file_record, url_record};

impl SeaOrmStorage {
    /// 插入文件记录；标识符已存在时返回 `DuplicateKey`
    pub async fn insert_file(&self, record: &FileRecord) -> Result<()> {
        let db = &self.db;

        retry::with_retry(
            &format!("insert_file({})", record.identifier),
            self.retry_config,
            || async {
                file_record::Entity::insert(file_record_to_active_model(record))
                    .exec_without_returning(db)
                    .await
            },
        )
        .await?;

        info!(
            "File record created: {} (expires at {})",
            record.identifier, record.expires_at
        );
        Ok(())
    }

    /// 插入短链接记录；标识符已存在时返回 `DuplicateKey`
    pub async fn insert_url(&self, record: &UrlRecord) -> Result<()> {
        let db = &self.db;

        retry::with_retry(
            &format!("insert_url({})", record.identifier),
            self.retry_config,
            || async {
                url_record::Entity::insert(url_record_to_active_model(record))
                    .exec_without_returning(db)
                    .await
            },
        )
        .await?;

        info!(
            "URL record created: {} -> {}",
            record.identifier,
            if record.target_url.len() > 50 {
                format!("{}...", record.target_url.chars().take(50).collect::<String>())
            } else {
                record.target_url.clone()
            }
        );
        Ok(())
    }

    /// 批量删除 expires_at <= cutoff 的文件记录
    pub async fn delete_expired_files(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;

        let result = retry::with_retry("delete_expired_files", self.retry_config, || async {
            file_record::Entity::delete_many()
                .filter(file_record::Column::ExpiresAt.lte(cutoff))
                .exec(db)
                .await
        })
        .await?;

        debug!("Deleted {} expired file records", result.rows_affected);
        Ok(result.rows_affected)
    }

    /// 批量删除 expires_at <= cutoff 的短链接记录
    pub async fn delete_expired_urls(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;

        let result = retry::with_retry("delete_expired_urls", self.retry_config, || async {
            url_record::Entity::delete_many()
                .filter(url_record::Column::ExpiresAt.lte(cutoff))
                .exec(db)
                .await
        })
        .await?;

        debug!("Deleted {} expired url records", result.rows_affected);
        Ok(result.rows_affected)
    }
}
