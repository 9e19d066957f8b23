use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::trace;

use super::{PublicBaseUrl, error_response};
use crate::errors::EphemeraError;
use crate::services::ContentService;

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub long: bool,
}

pub struct ShortenService {}

impl ShortenService {
    /// `POST /shorten`，请求体 `{"url": "...", "long": false}`
    ///
    /// The body is parsed by hand so malformed JSON gets the same plain-text
    /// 400 as an empty URL.
    pub async fn handle_shorten(
        req: HttpRequest,
        body: web::Bytes,
        service: web::Data<Arc<ContentService>>,
        base: web::Data<PublicBaseUrl>,
    ) -> impl Responder {
        let request: ShortenRequest = match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                trace!("Malformed shorten request: {}", e);
                return error_response(&EphemeraError::invalid_input("malformed JSON body"));
            }
        };

        match service.shorten(&request.url, request.long).await {
            Ok(stored) => HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(format!(
                    "Short URL: {}\n",
                    base.link(&req, &stored.public_path)
                )),
            Err(e) => error_response(&e),
        }
    }
}
