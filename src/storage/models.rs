use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One uploaded file. `identifier` is also the blob file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub identifier: String,
    /// 客户端提供的原始文件名，只用于推断 Content-Type，不参与路径拼接
    pub display_name: String,
    pub expires_at: DateTime<Utc>,
}

/// One shortened URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub identifier: String,
    pub target_url: String,
    pub expires_at: DateTime<Utc>,
}

impl FileRecord {
    #[inline]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl UrlRecord {
    #[inline]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Row counts of both collections, expired-but-unswept rows included
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStats {
    pub files: u64,
    pub urls: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_liveness_boundary() {
        let now = Utc::now();
        let record = UrlRecord {
            identifier: "abc".to_string(),
            target_url: "https://example.com".to_string(),
            expires_at: now,
        };
        // now == expires_at 即视为过期
        assert!(!record.is_live(now));
        assert!(record.is_live(now - Duration::seconds(1)));
    }
}
