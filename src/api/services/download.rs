use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use tokio_util::io::ReaderStream;

use super::error_response;
use crate::services::ContentService;

pub struct DownloadService {}

impl DownloadService {
    /// `GET /{identifier}`：按存储的原始文件名推断 Content-Type 并流式返回
    pub async fn handle_download(
        path: web::Path<String>,
        service: web::Data<Arc<ContentService>>,
    ) -> impl Responder {
        let identifier = path.into_inner();

        let resolved = match service.resolve_file(&identifier).await {
            Ok(resolved) => resolved,
            Err(e) => return error_response(&e),
        };

        HttpResponse::Ok()
            .content_type(resolved.content_type)
            .insert_header((
                "Content-Disposition",
                format!(
                    "inline; filename=\"{}\"",
                    header_safe_filename(&resolved.display_name)
                ),
            ))
            .no_chunking(resolved.len)
            .streaming(ReaderStream::new(resolved.file))
    }
}

/// Strips what cannot appear inside a quoted header parameter
fn header_safe_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars()
        .filter(|c| !c.is_control() && *c != '"' && c.is_ascii())
        .collect()
}
