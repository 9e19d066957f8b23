//! Server mode
//!
//! Starts storage, the sweeper and the HTTP server, and ties their shutdown
//! together.

use actix_web::{App, HttpServer, middleware::DefaultHeaders, web};
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::services::{PublicBaseUrl, content_routes};
use crate::config::get_config;
use crate::runtime::lifetime;

/// Run the HTTP server
///
/// 1. Prepares storage and services
/// 2. Removes orphan blobs left by earlier crashes
/// 3. Spawns the sweeper
/// 4. Serves until the server exits or Ctrl+C arrives
///
/// **Note**: Logging must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let config = get_config();

    let startup = lifetime::startup::prepare_startup(&config)
        .await
        .inspect_err(|e| tracing::error!("Server startup failed: {:#}", e))?;

    startup.sweeper.reclaim_orphans().await;

    let token = CancellationToken::new();
    let sweeper_handle = startup.sweeper.clone().spawn(token.clone());

    let content_service = startup.content_service.clone();
    let public_base = PublicBaseUrl::new(config.server.public_base_url.clone());

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(content_service.clone()))
            .app_data(web::Data::new(public_base.clone()))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .service(content_routes())
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .workers(cpu_count)
    .disable_signals()
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let server_handle = server.handle();
    let mut server_task = actix_web::rt::spawn(server);
    warn!("Starting server at http://{}", bind_address);

    let server_result = tokio::select! {
        res = &mut server_task => match res {
            Ok(inner) => inner.context("HTTP server terminated with an error"),
            Err(e) => Err(anyhow::anyhow!("HTTP server task failed: {}", e)),
        },
        _ = lifetime::shutdown::wait_for_signal() => {
            server_handle.stop(true).await;
            Ok(())
        }
    };

    lifetime::shutdown::stop_sweeper(token, sweeper_handle).await;
    info!("Graceful shutdown: all tasks completed");

    server_result
}
