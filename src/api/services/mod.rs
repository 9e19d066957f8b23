pub mod download;
pub mod redirect;
pub mod shorten;
pub mod stats;
pub mod upload;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::error;

use crate::errors::EphemeraError;

pub use download::DownloadService;
pub use redirect::RedirectService;
pub use shorten::ShortenService;
pub use stats::StatsService;
pub use upload::UploadService;

/// 对外链接前缀；未配置时按请求 Host 生成 `https://{host}`
#[derive(Debug, Clone, Default)]
pub struct PublicBaseUrl(pub Option<String>);

impl PublicBaseUrl {
    pub fn new(base: Option<String>) -> Self {
        Self(
            base.map(|b| b.trim().trim_end_matches('/').to_string())
                .filter(|b| !b.is_empty()),
        )
    }

    /// Joins `path` (which starts with `/`) onto the base
    pub fn link(&self, req: &HttpRequest, path: &str) -> String {
        match &self.0 {
            Some(base) => format!("{}{}", base, path),
            None => format!("https://{}{}", req.connection_info().host(), path),
        }
    }
}

/// 错误到 HTTP 状态码的映射
///
/// NotFound 的响应体固定，不区分不存在、已过期、非法标识符。
pub fn error_response(err: &EphemeraError) -> HttpResponse {
    match err {
        EphemeraError::InvalidInput(msg) => HttpResponse::build(StatusCode::BAD_REQUEST)
            .content_type("text/plain; charset=utf-8")
            .body(format!("Invalid input: {}\n", msg)),
        EphemeraError::NotFound(_) => not_found_response(),
        other => {
            error!("Request failed: {}", other);
            HttpResponse::build(StatusCode::INTERNAL_SERVER_ERROR)
                .content_type("text/plain; charset=utf-8")
                .body("Internal Server Error\n")
        }
    }
}

#[inline]
pub fn not_found_response() -> HttpResponse {
    HttpResponse::build(StatusCode::NOT_FOUND)
        .content_type("text/plain; charset=utf-8")
        .body("Not Found\n")
}

/// All public routes. `/{identifier}` is registered last so it does not
/// shadow the fixed paths.
pub fn content_routes() -> actix_web::Scope {
    web::scope("")
        .route("/upload", web::post().to(UploadService::handle_upload))
        .route("/shorten", web::post().to(ShortenService::handle_shorten))
        .route("/stats", web::get().to(StatsService::handle_stats))
        .route("/s/{identifier}", web::get().to(RedirectService::handle_redirect))
        .route("/{identifier}", web::get().to(DownloadService::handle_download))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_public_base_url_trims_trailing_slash() {
        let base = PublicBaseUrl::new(Some("https://drop.example.com/".to_string()));
        let req = TestRequest::default().to_http_request();
        assert_eq!(base.link(&req, "/s/abc"), "https://drop.example.com/s/abc");
    }

    #[test]
    fn test_public_base_url_falls_back_to_host() {
        let base = PublicBaseUrl::new(Some("  ".to_string()));
        let req = TestRequest::default()
            .insert_header(("Host", "files.local:8080"))
            .to_http_request();
        assert_eq!(base.link(&req, "/abc.txt"), "https://files.local:8080/abc.txt");
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(&EphemeraError::invalid_input("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(&EphemeraError::not_found("x")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(&EphemeraError::exhausted_retries("x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            error_response(&EphemeraError::storage("x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
