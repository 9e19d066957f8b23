//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};
use tracing::{error, trace};

use super::converters::{model_to_file_record, model_to_url_record};
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::{FileRecord, UrlRecord};

use migration::entities::{file_record, url_record};

impl SeaOrmStorage {
    /// 按标识符查询文件记录（不判断是否过期）
    pub async fn get_file(&self, identifier: &str) -> Result<Option<FileRecord>> {
        let db = &self.db;
        let id = identifier.to_string();

        let model = retry::with_retry(
            &format!("get_file({})", identifier),
            self.retry_config,
            || async { file_record::Entity::find_by_id(id.clone()).one(db).await },
        )
        .await
        .map_err(|e| {
            error!("查询文件记录失败（重试后仍失败）: {}", e);
            e
        })?;

        trace!("get_file({}) hit={}", identifier, model.is_some());
        Ok(model.map(model_to_file_record))
    }

    /// 按标识符查询短链接记录（不判断是否过期）
    pub async fn get_url(&self, identifier: &str) -> Result<Option<UrlRecord>> {
        let db = &self.db;
        let id = identifier.to_string();

        let model = retry::with_retry(
            &format!("get_url({})", identifier),
            self.retry_config,
            || async { url_record::Entity::find_by_id(id.clone()).one(db).await },
        )
        .await
        .map_err(|e| {
            error!("查询短链接记录失败（重试后仍失败）: {}", e);
            e
        })?;

        trace!("get_url({}) hit={}", identifier, model.is_some());
        Ok(model.map(model_to_url_record))
    }

    /// 列出 expires_at <= cutoff 的文件标识符（即 blob 文件名）及其过期时间
    pub async fn list_expired_files(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<(String, DateTime<Utc>)>> {
        let db = &self.db;

        let expired = retry::with_retry("list_expired_files", self.retry_config, || async {
            file_record::Entity::find()
                .select_only()
                .column(file_record::Column::Identifier)
                .column(file_record::Column::ExpiresAt)
                .filter(file_record::Column::ExpiresAt.lte(cutoff))
                .into_tuple::<(String, DateTime<Utc>)>()
                .all(db)
                .await
        })
        .await?;

        Ok(expired)
    }

    /// 列出 expires_at <= cutoff 的短链接标识符
    pub async fn list_expired_urls(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        let db = &self.db;

        let identifiers = retry::with_retry("list_expired_urls", self.retry_config, || async {
            url_record::Entity::find()
                .select_only()
                .column(url_record::Column::Identifier)
                .filter(url_record::Column::ExpiresAt.lte(cutoff))
                .into_tuple::<String>()
                .all(db)
                .await
        })
        .await?;

        Ok(identifiers)
    }

    /// 文件记录总数（包含已过期但尚未清理的记录）
    pub async fn count_files(&self) -> Result<u64> {
        let db = &self.db;
        let count = retry::with_retry("count_files", self.retry_config, || async {
            file_record::Entity::find().count(db).await
        })
        .await?;
        Ok(count)
    }

    /// 短链接记录总数（包含已过期但尚未清理的记录）
    pub async fn count_urls(&self) -> Result<u64> {
        let db = &self.db;
        let count = retry::with_retry("count_urls", self.retry_config, || async {
            url_record::Entity::find().count(db).await
        })
        .await?;
        Ok(count)
    }
}
