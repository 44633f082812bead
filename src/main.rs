use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use ink_it::{
    app::AppState,
    config::Config,
    mcp_server::InkItServer,
    storage::{ORIGINALS_DIR, TATTOOS_DIR},
    web_pages,
};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let bind_address = format!("0.0.0.0:{}", config.port);
    let mcp_path = config.scoped_path("/mcp");
    let upload_path = config.scoped_path("/upload");

    let state = Arc::new(AppState::from_config(&config)?);
    let state_for_service = state.clone();
    let service = StreamableHttpService::new(
        move || Ok(InkItServer::new(state_for_service.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new()
        .route(
            &upload_path,
            get(web_pages::upload_page)
                .post(web_pages::handle_image_upload)
                .layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
        .nest_service(&mcp_path, service)
        .nest_service(
            &format!("/files/{ORIGINALS_DIR}"),
            ServeDir::new(config.data_dir.join(ORIGINALS_DIR)),
        )
        .nest_service(
            &format!("/files/{TATTOOS_DIR}"),
            ServeDir::new(config.data_dir.join(TATTOOS_DIR)),
        )
        .with_state(state);
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!(
        provider = ?config.provider_kind(),
        address = %bind_address,
        mcp = %mcp_path,
        upload = %upload_path,
        "ink-it server started"
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
