use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;

use super::error_response;
use crate::services::ContentService;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub format: Option<String>,
}

pub struct StatsService {}

impl StatsService {
    /// `GET /stats`，`?format=json` 返回 JSON，否则纯文本
    pub async fn handle_stats(
        query: web::Query<StatsQuery>,
        service: web::Data<Arc<ContentService>>,
    ) -> impl Responder {
        let stats = match service.stats().await {
            Ok(stats) => stats,
            Err(e) => return error_response(&e),
        };

        if query.format.as_deref() == Some("json") {
            HttpResponse::Ok().json(stats)
        } else {
            HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(format!(
                    "Files stored: {}\nShort URLs stored: {}\n",
                    stats.files, stats.urls
                ))
        }
    }
}
