//! Async image synthesis — external image generation with placeholder
//! substitution and deferred cross-slide propagation.
//!
//! `schedule` returns immediately with a placeholder so layout proceeds
//! synchronously; a background task performs the actual generation call.
//! After the deck is assembled, `propagate` performs a bounded-poll join:
//! on success the generated asset replaces the placeholder (and, for the
//! cover slide, every other slide's background slot); on failure the local
//! pool is the silent fallback; on timeout the slides keep what they have.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::images::allocator::{fill_image_slot, ImagePool};
use crate::models::slides::{Deck, SlideKind, SlotRole};

/// Shown in the slot while the external call is in flight.
pub const PLACEHOLDER_SRC: &str =
    "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='4' height='3'%3E%3Crect width='4' height='3' fill='%23d8dde4'/%3E%3C/svg%3E";

/// Fixed interval between polls of a pending generation result.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

// ────────────────────────────────────────────────────────────────────────────
// Capability trait
// ────────────────────────────────────────────────────────────────────────────

/// Result of one external image-generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image_url: String,
}

/// The external image-generation capability. The engine depends only on
/// this signature; carried in `AppState` as `Arc<dyn ImageGenerator>`.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP implementation
// ────────────────────────────────────────────────────────────────────────────

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
struct GenerateRequestBody<'a> {
    prompt: &'a str,
}

/// Calls an external HTTP image-generation endpoint.
/// Retries on 429 and 5xx with exponential backoff.
pub struct HttpImageGenerator {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpImageGenerator {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, AppError> {
        let body = GenerateRequestBody { prompt };
        let mut last_error: Option<AppError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Image generation attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(AppError::ImageGen(format!("HTTP error: {e}")));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let text = response.text().await.unwrap_or_default();
                last_error = Some(AppError::ImageGen(format!(
                    "API returned {status}: {text}"
                )));
                continue;
            }
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(AppError::ImageGen(format!("API returned {status}: {text}")));
            }

            let image: GeneratedImage = response
                .json()
                .await
                .map_err(|e| AppError::ImageGen(format!("Bad response body: {e}")))?;
            debug!("Image generated: {}", image.image_url);
            return Ok(image);
        }

        Err(last_error
            .unwrap_or_else(|| AppError::ImageGen("Generation failed with no attempts".into())))
    }
}

/// Stand-in used when no image API is configured. Always fails, which sends
/// every designated slot down the local-pool fallback path.
pub struct DisabledImageGenerator;

#[async_trait]
impl ImageGenerator for DisabledImageGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, AppError> {
        Err(AppError::ImageGen(
            "image generation is not configured".to_string(),
        ))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pending result handle
// ────────────────────────────────────────────────────────────────────────────

type ResultCell = Arc<Mutex<Option<Result<String, String>>>>;

/// Handle to an in-flight generation targeting one slot of one slide.
#[derive(Clone)]
pub struct PendingImage {
    pub slide_id: Uuid,
    pub slot_id: Uuid,
    cell: ResultCell,
}

impl PendingImage {
    /// Non-blocking check: `None` while the task is still running.
    pub fn poll(&self) -> Option<Result<String, String>> {
        self.cell.lock().expect("pending image lock poisoned").clone()
    }

    #[cfg(test)]
    pub fn resolved(slide_id: Uuid, slot_id: Uuid, result: Result<String, String>) -> Self {
        PendingImage {
            slide_id,
            slot_id,
            cell: Arc::new(Mutex::new(Some(result))),
        }
    }
}

/// Starts a background generation task for a slot. The caller must have
/// already assigned `PLACEHOLDER_SRC` to the slot; the result is observed
/// later through the returned handle.
pub fn schedule(
    generator: Arc<dyn ImageGenerator>,
    prompt: String,
    slide_id: Uuid,
    slot_id: Uuid,
) -> PendingImage {
    let cell: ResultCell = Arc::new(Mutex::new(None));
    let task_cell = cell.clone();

    tokio::spawn(async move {
        let outcome = match generator.generate(&prompt).await {
            Ok(image) => Ok(image.image_url),
            Err(e) => Err(e.to_string()),
        };
        *task_cell.lock().expect("pending image lock poisoned") = Some(outcome);
    });

    PendingImage {
        slide_id,
        slot_id,
        cell,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bounded-wait propagation
// ────────────────────────────────────────────────────────────────────────────

/// Waits (bounded by `max_wait`) for a pending generation, then applies it
/// to the deck:
/// - success: the asset replaces the placeholder in the originating slot
///   and, when the originating slide is the deck's cover, every other
///   slide's `Background`-role image slot.
/// - failure: the originating slot falls back to the local pool, silently.
/// - timeout: nothing happens; slides keep their placeholder.
pub async fn propagate(
    deck: &mut Deck,
    pending: &PendingImage,
    pool: &mut ImagePool,
    rng: &mut impl Rng,
    max_wait: Duration,
) {
    let mut waited = Duration::ZERO;
    let outcome = loop {
        if let Some(outcome) = pending.poll() {
            break Some(outcome);
        }
        if waited >= max_wait {
            break None;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
        waited += POLL_INTERVAL;
    };

    match outcome {
        Some(Ok(url)) => apply_generated(deck, pending, &url),
        Some(Err(reason)) => {
            warn!("Image generation failed, using local pool: {reason}");
            apply_pool_fallback(deck, pending, pool, rng);
        }
        None => {
            warn!(
                "Image generation did not resolve within {}ms; keeping placeholder",
                max_wait.as_millis()
            );
        }
    }
}

fn apply_generated(deck: &mut Deck, pending: &PendingImage, url: &str) {
    let from_cover = deck
        .slides
        .iter()
        .any(|s| s.id == pending.slide_id && s.kind == SlideKind::Cover);

    let mut updated = 0usize;
    for slide in deck.slides.iter_mut() {
        for slot in slide.elements.iter_mut() {
            let is_origin = slide.id == pending.slide_id && slot.id == pending.slot_id;
            let is_dependent = from_cover
                && slide.id != pending.slide_id
                && slot.kind == crate::models::slides::SlotKind::Image
                && slot.role == Some(SlotRole::Background);
            if is_origin || is_dependent {
                slot.src = Some(url.to_string());
                updated += 1;
            }
        }
    }
    info!("Generated image propagated to {updated} slot(s)");
}

fn apply_pool_fallback(deck: &mut Deck, pending: &PendingImage, pool: &mut ImagePool, rng: &mut impl Rng) {
    for slide in deck.slides.iter_mut() {
        if slide.id != pending.slide_id {
            continue;
        }
        for slot in slide.elements.iter_mut() {
            if slot.id == pending.slot_id {
                *slot = fill_image_slot(slot, pool, rng);
                return;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
