use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use futures_util::StreamExt;
use tracing::{debug, error};

use super::{PublicBaseUrl, error_response};
use crate::errors::EphemeraError;
use crate::services::ContentService;

pub struct UploadService {}

/// Parsed `file` field
struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

impl UploadService {
    /// `POST /upload`：multipart 字段 `file`（必须带文件名），可选字段 `long=true`
    pub async fn handle_upload(
        req: HttpRequest,
        mut payload: Multipart,
        service: web::Data<Arc<ContentService>>,
        base: web::Data<PublicBaseUrl>,
    ) -> impl Responder {
        let limit = service.settings().max_upload_bytes;
        let mut file: Option<UploadedFile> = None;
        let mut long = false;

        // long 可能出现在 file 之后，所以先读完整个表单
        while let Some(item) = payload.next().await {
            let mut field = match item {
                Ok(f) => f,
                Err(e) => {
                    debug!("Invalid multipart data: {}", e);
                    return error_response(&EphemeraError::invalid_input("invalid multipart data"));
                }
            };

            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => {
                    let filename = field
                        .content_disposition()
                        .and_then(|cd| cd.get_filename())
                        .unwrap_or("")
                        .to_string();

                    let mut data = Vec::new();
                    while let Some(chunk) = field.next().await {
                        match chunk {
                            Ok(bytes) => {
                                if limit.is_some_and(|l| (data.len() + bytes.len()) as u64 > l) {
                                    return error_response(&EphemeraError::invalid_input(
                                        format!(
                                            "upload exceeds the maximum size of {} bytes",
                                            limit.unwrap_or_default()
                                        ),
                                    ));
                                }
                                data.extend_from_slice(&bytes);
                            }
                            Err(e) => {
                                error!("Failed to read upload chunk: {}", e);
                                return error_response(&EphemeraError::invalid_input(
                                    "failed to read uploaded file",
                                ));
                            }
                        }
                    }
                    file = Some(UploadedFile { filename, data });
                }
                "long" => {
                    let mut data = Vec::new();
                    while let Some(chunk) = field.next().await {
                        if let Ok(bytes) = chunk {
                            data.extend_from_slice(&bytes);
                        }
                    }
                    long = String::from_utf8_lossy(&data).trim() == "true";
                }
                _ => {
                    // 忽略未知字段
                }
            }
        }

        let Some(file) = file else {
            return error_response(&EphemeraError::invalid_input("missing file field"));
        };

        match service
            .upload(&file.filename, file.data.as_slice(), long)
            .await
        {
            Ok(stored) => HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(format!(
                    "File uploaded successfully: {}\n",
                    base.link(&req, &stored.public_path)
                )),
            Err(e) => error_response(&e),
        }
    }
}
