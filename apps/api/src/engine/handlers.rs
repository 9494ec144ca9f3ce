use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::engine::assembler::{synthesize, AssembleInput, AssemblerContext};
use crate::errors::AppError;
use crate::models::blocks::{ContentBlock, ImagePoolItem};
use crate::models::slides::{Deck, GeneratedSlide, Template};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SynthesizeRequest {
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub images: Vec<ImagePoolItem>,
}

#[derive(Serialize)]
pub struct SynthesizeResponse {
    pub slides: Vec<GeneratedSlide>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct TemplateListResponse {
    pub templates: Vec<Template>,
}

/// POST /api/v1/decks/synthesize
///
/// Runs one full synthesis pass over the submitted blocks against a fresh
/// deck and returns the generated slides. The response is held back for at
/// most the configured wait window when a cover image was requested, so the
/// returned slides already carry the propagated asset when it arrives in
/// time.
pub async fn handle_synthesize(
    State(state): State<AppState>,
    Json(req): Json<SynthesizeRequest>,
) -> Result<Json<SynthesizeResponse>, AppError> {
    if req.blocks.is_empty() {
        return Err(AppError::Validation("blocks must not be empty".to_string()));
    }

    let ctx = AssemblerContext {
        library: &state.templates,
        measurer: state.measurer.as_ref(),
        generator: state.image_generator.clone(),
    };
    let mut deck = Deck::default();
    // The thread-local rng is not Send; this future must be.
    let mut rng = StdRng::from_os_rng();
    synthesize(
        &ctx,
        &mut deck,
        AssembleInput {
            blocks: req.blocks,
            images: req.images,
        },
        Duration::from_millis(state.config.cover_image_wait_ms),
        &mut rng,
    )
    .await?;

    Ok(Json(SynthesizeResponse {
        slides: deck.slides,
        generated_at: Utc::now(),
    }))
}

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
) -> Result<Json<TemplateListResponse>, AppError> {
    Ok(Json(TemplateListResponse {
        templates: state.templates.all().to_vec(),
    }))
}
