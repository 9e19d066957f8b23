use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use tracing::trace;

use super::error_response;
use crate::services::ContentService;

pub struct RedirectService {}

impl RedirectService {
    /// `GET /s/{identifier}` → 302
    pub async fn handle_redirect(
        path: web::Path<String>,
        service: web::Data<Arc<ContentService>>,
    ) -> impl Responder {
        let identifier = path.into_inner();

        match service.resolve_url(&identifier).await {
            Ok(target) => {
                trace!("Redirecting {} -> {}", identifier, target);
                HttpResponse::Found()
                    .insert_header(("Location", target))
                    .finish()
            }
            Err(e) => error_response(&e),
        }
    }
}
