//! kbchat Gateway - entry point

use anyhow::Context;
use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kbchat_gateway::{build_routes, AppState, Config, GATEWAY_VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "kbchat_gateway=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting kbchat gateway v{}", GATEWAY_VERSION);

    let store = config
        .connect_store()
        .await
        .context("failed to connect knowledge store")?;
    let cache = config.connect_cache().await;
    tracing::info!(
        store = store.backend_name(),
        cache = cache.as_ref().map_or("none", |c| c.backend_name()),
        kb_name = %config.kb_name,
        "Services initialized"
    );

    let app = Router::new()
        .merge(build_routes(AppState::new(store, cache, config.kb_name.clone())))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", config.bind);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
