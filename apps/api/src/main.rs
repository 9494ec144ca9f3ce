mod config;
mod engine;
mod errors;
mod images;
mod layout;
mod models;
mod routes;
mod state;
mod templates;

use anyhow::Result;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::images::synthesizer::{DisabledImageGenerator, HttpImageGenerator, ImageGenerator};
use crate::layout::CharTableMeasurer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::templates::{builtin_library, TemplateLibrary};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting DeckForge API v{}", env!("CARGO_PKG_VERSION"));

    // Template library: external JSON file, or the builtin set
    let templates = match &config.templates_path {
        Some(path) => {
            let library = TemplateLibrary::from_file(Path::new(path))?;
            info!("Loaded {} template(s) from {path}", library.all().len());
            library
        }
        None => {
            let library = builtin_library();
            info!("Using builtin template library ({} templates)", library.all().len());
            library
        }
    };

    // Image-generation capability, optional
    let image_generator: Arc<dyn ImageGenerator> =
        match (&config.image_api_url, &config.image_api_key) {
            (Some(url), Some(key)) => {
                info!("Image generation enabled ({url})");
                Arc::new(HttpImageGenerator::new(url.clone(), key.clone()))
            }
            _ => {
                info!("Image generation disabled; using local pool only");
                Arc::new(DisabledImageGenerator)
            }
        };

    let state = AppState {
        config: config.clone(),
        templates: Arc::new(templates),
        measurer: Arc::new(CharTableMeasurer::new()),
        image_generator,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
