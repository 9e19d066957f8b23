//! HTTP boundary tests

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use chrono::{DateTime, Duration, TimeZone, Utc};
use ephemera::api::services::{PublicBaseUrl, content_routes};
use ephemera::config::DatabaseConfig;
use ephemera::services::{ContentService, ContentSettings};
use ephemera::storage::{BlobStore, SeaOrmStorage};
use ephemera::utils::{Clock, ManualClock, RandomIdentifiers};
use tempfile::TempDir;

const BOUNDARY: &str = "----ephemera-test-boundary";
const BASE: &str = "https://drop.test";

struct Harness {
    service: Arc<ContentService>,
    storage: Arc<SeaOrmStorage>,
    clock: Arc<ManualClock>,
    _dir: TempDir,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

async fn harness() -> Harness {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = DatabaseConfig {
        database_url: format!("sqlite://{}?mode=rwc", dir.path().join("meta.db").display()),
        ..Default::default()
    };
    let storage = Arc::new(SeaOrmStorage::new(&config).await.unwrap());
    let blobs = Arc::new(BlobStore::new(dir.path().join("uploads")).await.unwrap());
    let clock = Arc::new(ManualClock::new(start()));
    let settings = ContentSettings {
        max_upload_bytes: Some(1024),
        ..ContentSettings::default()
    };

    let service = Arc::new(ContentService::new(
        storage.clone(),
        blobs,
        Arc::new(RandomIdentifiers::new(8)),
        clock.clone() as Arc<dyn Clock>,
        settings,
    ));

    Harness {
        service,
        storage,
        clock,
        _dir: dir,
    }
}

macro_rules! init_app {
    ($service:expr, $base:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($service.clone()))
                .app_data(web::Data::new(PublicBaseUrl::new($base)))
                .service(content_routes()),
        )
        .await
    };
}

/// 构造 multipart/form-data 请求体
fn multipart_body(file: Option<(&str, &[u8])>, long: Option<&str>, long_first: bool) -> Vec<u8> {
    let mut body = Vec::new();
    let mut push_long = |body: &mut Vec<u8>| {
        if let Some(value) = long {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"long\"\r\n\r\n{}\r\n",
                    BOUNDARY, value
                )
                .as_bytes(),
            );
        }
    };

    if long_first {
        push_long(&mut body);
    }
    if let Some((filename, content)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    if !long_first {
        push_long(&mut body);
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/upload")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
}

fn link_from(body: &[u8], prefix: &str) -> String {
    let text = std::str::from_utf8(body).unwrap();
    text.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix('\n'))
        .unwrap_or_else(|| panic!("unexpected body: {:?}", text))
        .to_string()
}

#[actix_rt::test]
async fn test_upload_and_download() {
    let h = harness().await;
    let app = init_app!(h.service, Some(BASE.to_string()));

    let req = upload_request(multipart_body(Some(("notes.txt", &b"hello"[..])), None, false));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let link = link_from(&body, "File uploaded successfully: ");
    let path = link.strip_prefix(BASE).unwrap().to_string();
    assert!(path.ends_with(".txt"));

    let resp = test::call_service(&app, test::TestRequest::get().uri(&path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("Content-Type").unwrap(),
        "text/plain"
    );
    assert_eq!(
        resp.headers().get("Content-Disposition").unwrap(),
        "inline; filename=\"notes.txt\""
    );
    assert_eq!(test::read_body(resp).await.as_ref(), b"hello");
}

#[actix_rt::test]
async fn test_long_field_after_file_is_honoured() {
    let h = harness().await;
    let app = init_app!(h.service, Some(BASE.to_string()));

    let req = upload_request(multipart_body(Some(("a.bin", &b"x"[..])), Some("true"), false));
    let body = test::call_and_read_body(&app, req.to_request()).await;
    let link = link_from(&body, "File uploaded successfully: ");
    let identifier = link.rsplit('/').next().unwrap();

    let record = h.storage.get_file(identifier).await.unwrap().unwrap();
    assert_eq!(record.expires_at, start() + Duration::days(30));

    let req = upload_request(multipart_body(Some(("b.bin", &b"y"[..])), Some("false"), true));
    let body = test::call_and_read_body(&app, req.to_request()).await;
    let link = link_from(&body, "File uploaded successfully: ");
    let identifier = link.rsplit('/').next().unwrap();

    let record = h.storage.get_file(identifier).await.unwrap().unwrap();
    assert_eq!(record.expires_at, start() + Duration::hours(1));
}

#[actix_rt::test]
async fn test_upload_errors_are_bad_request() {
    let h = harness().await;
    let app = init_app!(h.service, Some(BASE.to_string()));

    // 缺少 file 字段
    let req = upload_request(multipart_body(None, Some("true"), true));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // 超过大小限制
    let big = vec![b'z'; 2048];
    let req = upload_request(multipart_body(Some(("big.bin", big.as_slice())), None, false));
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(h.storage.count_files().await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_shorten_and_redirect() {
    let h = harness().await;
    let app = init_app!(h.service, Some(BASE.to_string()));

    let req = test::TestRequest::post()
        .uri("/shorten")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(r#"{"url":"https://example.com/target","long":false}"#);
    let body = test::call_and_read_body(&app, req.to_request()).await;
    let link = link_from(&body, "Short URL: ");
    let path = link.strip_prefix(BASE).unwrap().to_string();
    assert!(path.starts_with("/s/"));

    let resp = test::call_service(&app, test::TestRequest::get().uri(&path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get("Location").unwrap(),
        "https://example.com/target"
    );

    h.clock.advance(Duration::hours(1));
    let resp = test::call_service(&app, test::TestRequest::get().uri(&path).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_shorten_rejects_bad_input() {
    let h = harness().await;
    let app = init_app!(h.service, Some(BASE.to_string()));

    for payload in [r#"{"url":"   "}"#, "{not json", r#"{"url":"javascript:alert(1)"}"#] {
        let req = test::TestRequest::post()
            .uri("/shorten")
            .insert_header(("Content-Type", "application/json"))
            .set_payload(payload);
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {:?}", payload);
    }
    assert_eq!(h.storage.count_urls().await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_not_found_bodies_are_identical() {
    let h = harness().await;
    let app = init_app!(h.service, Some(BASE.to_string()));

    let stored = h.service.upload("gone.txt", &b"bye"[..], false).await.unwrap();
    h.clock.advance(Duration::hours(3));

    let expired = test::call_service(
        &app,
        test::TestRequest::get().uri(&stored.public_path).to_request(),
    )
    .await;
    assert_eq!(expired.status(), StatusCode::NOT_FOUND);
    let expired_body = test::read_body(expired).await;

    let absent = test::call_service(
        &app,
        test::TestRequest::get().uri("/Unknown1.txt").to_request(),
    )
    .await;
    assert_eq!(absent.status(), StatusCode::NOT_FOUND);
    assert_eq!(test::read_body(absent).await, expired_body);

    let traversal = test::call_service(
        &app,
        test::TestRequest::get().uri("/..%2F..%2Fetc%2Fpasswd").to_request(),
    )
    .await;
    assert_eq!(traversal.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_stats_text_and_json() {
    let h = harness().await;
    let app = init_app!(h.service, Some(BASE.to_string()));

    h.service.upload("a.txt", &b"a"[..], false).await.unwrap();
    h.service.shorten("https://a.example.com", false).await.unwrap();
    h.service.shorten("https://b.example.com", false).await.unwrap();

    let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/stats").to_request()).await;
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "Files stored: 1\nShort URLs stored: 2\n"
    );

    let json: serde_json::Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/stats?format=json").to_request(),
    )
    .await;
    assert_eq!(json, serde_json::json!({"files": 1, "urls": 2}));
}

#[actix_rt::test]
async fn test_links_fall_back_to_host_header() {
    let h = harness().await;
    let app = init_app!(h.service, None);

    let req = test::TestRequest::post()
        .uri("/shorten")
        .insert_header(("Host", "short.example:9000"))
        .set_payload(r#"{"url":"https://example.com"}"#);
    let body = test::call_and_read_body(&app, req.to_request()).await;
    let link = link_from(&body, "Short URL: ");
    assert!(link.starts_with("https://short.example:9000/s/"), "{}", link);
}
