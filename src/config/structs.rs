use serde::{Deserialize, Serialize};

use crate::errors::{EphemeraError, Result};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// TTL 上限（100 年），保证 now + ttl 不会溢出
pub const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量、公开访问前缀
/// - database: 元数据库连接配置
/// - storage: 上传目录与标识符生成
/// - expiry: 各类内容的存活时间与清理周期
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub expiry: ExpiryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：EPHEMERA，分隔符：__
    /// 示例：EPHEMERA__EXPIRY__FILE_TTL_SECS=600
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix("EPHEMERA")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 检查配置取值是否可用
    pub fn validate(&self) -> Result<()> {
        let expiry = &self.expiry;
        if expiry.file_ttl_secs == 0 || expiry.url_ttl_secs == 0 || expiry.long_ttl_secs == 0 {
            return Err(EphemeraError::config("TTL values must be greater than zero"));
        }
        if [expiry.file_ttl_secs, expiry.url_ttl_secs, expiry.long_ttl_secs]
            .iter()
            .any(|ttl| *ttl > MAX_TTL_SECS)
        {
            return Err(EphemeraError::config(format!(
                "TTL values must not exceed {} seconds",
                MAX_TTL_SECS
            )));
        }
        if expiry.sweep_interval_secs == 0 {
            return Err(EphemeraError::config(
                "expiry.sweep_interval_secs must be greater than zero",
            ));
        }
        if self.storage.identifier_length < 4 {
            return Err(EphemeraError::config(format!(
                "storage.identifier_length must be at least 4 (got {})",
                self.storage.identifier_length
            )));
        }
        if self.storage.max_identifier_attempts == 0 {
            return Err(EphemeraError::config(
                "storage.max_identifier_attempts must be at least 1",
            ));
        }
        if self.storage.upload_dir.trim().is_empty() {
            return Err(EphemeraError::config("storage.upload_dir must not be empty"));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 对外链接前缀，例如 https://drop.example.com；为空时使用请求 Host
    #[serde(default)]
    pub public_base_url: Option<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 上传文件与标识符配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_identifier_length")]
    pub identifier_length: usize,
    /// 标识符冲突时最多尝试次数（含首次）
    #[serde(default = "default_max_identifier_attempts")]
    pub max_identifier_attempts: u32,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

/// 过期与清理配置（单位：秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryConfig {
    #[serde(default = "default_file_ttl_secs")]
    pub file_ttl_secs: u64,
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
    #[serde(default = "default_long_ttl_secs")]
    pub long_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// 孤儿 blob 的最小存在时间，避免误删上传中的文件
    #[serde(default = "default_orphan_grace_secs")]
    pub orphan_grace_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_url() -> String {
    "sqlite://data/database.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_upload_dir() -> String {
    "data/uploads".to_string()
}

fn default_identifier_length() -> usize {
    8
}

fn default_max_identifier_attempts() -> u32 {
    5
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_file_ttl_secs() -> u64 {
    60 * 60
}

fn default_url_ttl_secs() -> u64 {
    60 * 60
}

fn default_long_ttl_secs() -> u64 {
    30 * 24 * 60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_orphan_grace_secs() -> u64 {
    60 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            public_base_url: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            identifier_length: default_identifier_length(),
            max_identifier_attempts: default_max_identifier_attempts(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            file_ttl_secs: default_file_ttl_secs(),
            url_ttl_secs: default_url_ttl_secs(),
            long_ttl_secs: default_long_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            orphan_grace_secs: default_orphan_grace_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
