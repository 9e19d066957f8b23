use std::path::Path;
use std::sync::Arc;

use crate::config::{DatabaseConfig, StorageConfig};
use crate::errors::Result;

pub mod backend;
pub mod blob;
pub mod models;

pub use backend::SeaOrmStorage;
pub use blob::BlobStore;
pub use models::{ContentStats, FileRecord, UrlRecord};

pub struct StorageFactory;

impl StorageFactory {
    /// 创建元数据存储（自动推断数据库类型并执行迁移）
    pub async fn create_metadata(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let storage = SeaOrmStorage::new(config).await?;
        Ok(Arc::new(storage))
    }

    /// 创建 blob 存储（上传目录不存在时自动创建）
    pub async fn create_blobs(config: &StorageConfig) -> Result<Arc<BlobStore>> {
        let store = BlobStore::new(Path::new(&config.upload_dir)).await?;
        Ok(Arc::new(store))
    }
}
