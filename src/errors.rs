use std::fmt;

use sea_orm::{DbErr, SqlErr};

#[derive(Debug, Clone)]
pub enum EphemeraError {
    InvalidInput(String),
    NotFound(String),
    DuplicateKey(String),
    ExhaustedRetries(String),
    Storage(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    Config(String),
}

impl EphemeraError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            EphemeraError::InvalidInput(_) => "E001",
            EphemeraError::NotFound(_) => "E002",
            EphemeraError::DuplicateKey(_) => "E003",
            EphemeraError::ExhaustedRetries(_) => "E004",
            EphemeraError::Storage(_) => "E005",
            EphemeraError::DatabaseConfig(_) => "E006",
            EphemeraError::DatabaseConnection(_) => "E007",
            EphemeraError::Config(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            EphemeraError::InvalidInput(_) => "Invalid Input",
            EphemeraError::NotFound(_) => "Resource Not Found",
            EphemeraError::DuplicateKey(_) => "Duplicate Key",
            EphemeraError::ExhaustedRetries(_) => "Identifier Retries Exhausted",
            EphemeraError::Storage(_) => "Storage Error",
            EphemeraError::DatabaseConfig(_) => "Database Configuration Error",
            EphemeraError::DatabaseConnection(_) => "Database Connection Error",
            EphemeraError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            EphemeraError::InvalidInput(msg)
            | EphemeraError::NotFound(msg)
            | EphemeraError::DuplicateKey(msg)
            | EphemeraError::ExhaustedRetries(msg)
            | EphemeraError::Storage(msg)
            | EphemeraError::DatabaseConfig(msg)
            | EphemeraError::DatabaseConnection(msg)
            | EphemeraError::Config(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, EphemeraError::DuplicateKey(_))
    }
}

impl fmt::Display for EphemeraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for EphemeraError {}

// 便捷的构造函数
impl EphemeraError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        EphemeraError::InvalidInput(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        EphemeraError::NotFound(msg.into())
    }

    pub fn duplicate_key<T: Into<String>>(msg: T) -> Self {
        EphemeraError::DuplicateKey(msg.into())
    }

    pub fn exhausted_retries<T: Into<String>>(msg: T) -> Self {
        EphemeraError::ExhaustedRetries(msg.into())
    }

    pub fn storage<T: Into<String>>(msg: T) -> Self {
        EphemeraError::Storage(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        EphemeraError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        EphemeraError::DatabaseConnection(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        EphemeraError::Config(msg.into())
    }
}

// 主键冲突单独映射为 DuplicateKey，由 ContentService 负责重试
impl From<DbErr> for EphemeraError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => EphemeraError::DuplicateKey(detail),
            _ => EphemeraError::Storage(err.to_string()),
        }
    }
}

impl From<std::io::Error> for EphemeraError {
    fn from(err: std::io::Error) -> Self {
        EphemeraError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EphemeraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            EphemeraError::invalid_input("x"),
            EphemeraError::not_found("x"),
            EphemeraError::duplicate_key("x"),
            EphemeraError::exhausted_retries("x"),
            EphemeraError::storage("x"),
            EphemeraError::database_config("x"),
            EphemeraError::database_connection("x"),
            EphemeraError::config("x"),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = EphemeraError::invalid_input("url must not be empty");
        assert_eq!(err.to_string(), "Invalid Input: url must not be empty");
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: EphemeraError = io.into();
        assert!(matches!(err, EphemeraError::Storage(_)));
    }

    #[test]
    fn test_generic_db_error_maps_to_storage() {
        let err: EphemeraError = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, EphemeraError::Storage(_)));
        assert!(!err.is_duplicate_key());
    }
}
