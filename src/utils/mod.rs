pub mod clock;
pub mod url_validator;

pub use clock::{Clock, ManualClock, SystemClock};

/// 标识符字符集：62 个字母数字
pub const IDENTIFIER_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// 标识符最大长度（含扩展名）
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// 扩展名最大长度（不含点）
const MAX_EXTENSION_LEN: usize = 16;

/// Generates a random token of `length` characters from [`IDENTIFIER_ALPHABET`].
///
/// Uses the thread-local generator, which is seeded from the OS once per
/// thread and shared by every call on that thread.
pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| {
        IDENTIFIER_ALPHABET[rand::random_range(0..IDENTIFIER_ALPHABET.len())] as char
    })
    .take(length)
    .collect()
}

/// Source of fresh identifier tokens
pub trait IdentifierSource: Send + Sync {
    fn generate(&self) -> String;
}

/// Default identifier source backed by [`generate_random_code`]
#[derive(Debug, Clone, Copy)]
pub struct RandomIdentifiers {
    length: usize,
}

impl RandomIdentifiers {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl IdentifierSource for RandomIdentifiers {
    fn generate(&self) -> String {
        generate_random_code(self.length)
    }
}

/// 检查标识符是否可以安全地作为上传目录下的单个文件名
///
/// 仅允许 ASCII 字母数字、`.`、`-`、`_`，且不能以 `.` 开头。
/// 这样路径分隔符、`..`、NUL 都会被拒绝。
pub fn validate_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier.len() <= MAX_IDENTIFIER_LEN
        && !identifier.starts_with('.')
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_'))
}

/// Derives the extension (with leading dot) from a client supplied filename.
///
/// Only the last path segment is considered. Anything that is not 1-16 ASCII
/// alphanumerics after the final dot is dropped rather than sanitized.
pub fn file_extension(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    match base.rfind('.') {
        // 隐藏文件（".bashrc"）没有扩展名
        Some(0) | None => String::new(),
        Some(idx) => {
            let ext = &base[idx + 1..];
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.bytes().all(|b| b.is_ascii_alphanumeric())
            {
                format!(".{}", ext)
            } else {
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_random_code_length_and_alphabet() {
        let code = generate_random_code(8);
        assert_eq!(code.len(), 8);
        assert!(code.bytes().all(|b| IDENTIFIER_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_random_code_rapid_calls_differ() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_random_code(8)).collect();
        // 62^8 空间下 1000 次调用不应出现重复
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_random_identifiers_uses_configured_length() {
        let source = RandomIdentifiers::new(12);
        assert_eq!(source.generate().len(), 12);
    }

    #[test]
    fn test_validate_identifier_accepts_generated() {
        assert!(validate_identifier("aB3dE6gH"));
        assert!(validate_identifier("aB3dE6gH.txt"));
        assert!(validate_identifier("a-b_c.tar"));
    }

    #[test]
    fn test_validate_identifier_rejects_traversal() {
        assert!(!validate_identifier(""));
        assert!(!validate_identifier("."));
        assert!(!validate_identifier(".."));
        assert!(!validate_identifier("../etc/passwd"));
        assert!(!validate_identifier("a/b"));
        assert!(!validate_identifier("a\\b"));
        assert!(!validate_identifier(".hidden"));
        assert!(!validate_identifier("nul\0byte"));
        assert!(!validate_identifier("with space"));
        assert!(!validate_identifier(&"a".repeat(MAX_IDENTIFIER_LEN + 1)));
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("notes.txt"), ".txt");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".bashrc"), "");
        assert_eq!(file_extension("trailing."), "");
        assert_eq!(file_extension("C:\\Users\\me\\photo.JPG"), ".JPG");
        assert_eq!(file_extension("dir.v2/file"), "");
        assert_eq!(file_extension("evil.t\\x"), "");
        assert_eq!(file_extension("weird.t x"), "");
        assert_eq!(file_extension("long.abcdefghijklmnopq"), "");
    }
}
