use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::services::{ContentService, ContentSettings, Sweeper};
use crate::storage::{BlobStore, SeaOrmStorage, StorageFactory};
use crate::utils::{RandomIdentifiers, SystemClock};

/// Everything the server and the CLI commands share
pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub blobs: Arc<BlobStore>,
    pub content_service: Arc<ContentService>,
    pub sweeper: Arc<Sweeper>,
}

/// 准备启动上下文
///
/// 校验配置、连接数据库并执行迁移、创建上传目录，然后组装服务。
/// 不会启动任何后台任务。
pub async fn prepare_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    config.validate().context("Invalid configuration")?;

    let storage = StorageFactory::create_metadata(&config.database)
        .await
        .context("Failed to create metadata store")?;
    info!("Using metadata backend: {}", storage.backend_name());

    let blobs = StorageFactory::create_blobs(&config.storage)
        .await
        .context("Failed to create upload directory")?;
    info!("Upload directory: {}", blobs.root().display());

    let clock = SystemClock::arc();
    let content_service = Arc::new(ContentService::new(
        storage.clone(),
        blobs.clone(),
        Arc::new(RandomIdentifiers::new(config.storage.identifier_length)),
        clock.clone(),
        ContentSettings::from_config(config),
    ));
    let sweeper = Arc::new(Sweeper::new(
        storage.clone(),
        blobs.clone(),
        clock,
        &config.expiry,
    ));

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        storage,
        blobs,
        content_service,
        sweeper,
    })
}
