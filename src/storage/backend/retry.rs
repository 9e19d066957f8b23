//! 瞬时数据库错误重试
//!
//! 只重试连接获取失败、锁等待、死锁、SQLite BUSY 这类与语句内容无关的错误。
//! 主键冲突永远不会在这里重试：换标识符重新插入是 ContentService 的职责。

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Driver error codes that signal contention rather than a bad statement
const TRANSIENT_CODES: &[&str] = &[
    // MySQL: deadlock, lock wait timeout
    "1213", "1205", //
    // PostgreSQL: serialization failure, deadlock
    "40001", "40P01", //
    // SQLite: BUSY, LOCKED
    "5", "6",
];

const TRANSIENT_MESSAGES: &[&str] = &[
    "deadlock",
    "lock wait timeout",
    "database is locked",
    "serialization failure",
];

/// 判断数据库错误是否值得重试
pub fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(runtime) | DbErr::Query(runtime) => is_transient_runtime(runtime),
        _ => false,
    }
}

fn is_transient_runtime(err: &RuntimeErr) -> bool {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use std::ops::Deref;
            let code = sqlx_err
                .deref()
                .as_database_error()
                .and_then(|db_err| db_err.code().map(|c| c.into_owned()));
            match code {
                Some(code) => TRANSIENT_CODES.contains(&code.as_str()),
                None => mentions_contention(&sqlx_err.to_string()),
            }
        }
        RuntimeErr::Internal(msg) => mentions_contention(msg),
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

fn mentions_contention(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MESSAGES.iter().any(|m| lower.contains(m))
}

/// 重试配置
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based): exponential, capped at
    /// `max_delay_ms`, plus up to 25% jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exp.min(self.max_delay_ms);
        let jitter = rand::random_range(0..=capped / 4);
        Duration::from_millis(capped.saturating_add(jitter))
    }
}

/// 执行数据库操作，瞬时错误按指数退避重试
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut retries = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("'{}' succeeded after {} retries", operation_name, retries);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_transient(&err) || retries >= config.max_retries {
            return Err(err);
        }

        retries += 1;
        let delay = config.backoff(retries);
        warn!(
            "'{}' failed (attempt {}/{}): {}; retrying in {:?}",
            operation_name,
            retries,
            config.max_retries + 1,
            err,
            delay
        );
        sleep(delay).await;
    }
}
