use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
///
/// The image-generation capability is optional: without `IMAGE_API_URL` and
/// `IMAGE_API_KEY` the engine still synthesizes decks, falling back to the
/// local image pool for every image slot.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub image_api_url: Option<String>,
    pub image_api_key: Option<String>,
    /// Path to a JSON template library. Built-in library used when absent.
    pub templates_path: Option<String>,
    /// Maximum time a synthesize request waits for the cover background
    /// image before giving up on propagation.
    pub cover_image_wait_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            image_api_url: std::env::var("IMAGE_API_URL").ok(),
            image_api_key: std::env::var("IMAGE_API_KEY").ok(),
            templates_path: std::env::var("TEMPLATES_PATH").ok(),
            cover_image_wait_ms: std::env::var("COVER_IMAGE_WAIT_MS")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u64>()
                .context("COVER_IMAGE_WAIT_MS must be a number of milliseconds")?,
        })
    }
}
