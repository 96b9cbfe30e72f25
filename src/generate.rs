//! Eager (full-result) generation entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: run the whole page plan, then
//! return the assembled [`InvitationResult`]. Use
//! [`crate::stream::generate_invitation_stream`] instead when the caller
//! wants pages progressively (e.g. a UI showing each card as it lands).
//!
//! The pipeline within one request is strictly sequential — page k needs
//! page k−1's output as its continuity reference — so there is no
//! intra-request parallelism to exploit. A page failure aborts the
//! remaining pages and surfaces the first error; pages already written to
//! the output directory stay there.

use crate::client::gemini::GeminiClient;
use crate::client::maps::StaticMapClient;
use crate::client::{ImageModel, ReferenceImage, TextModel};
use crate::config::WedcardConfig;
use crate::error::WedcardError;
use crate::output::{GenerationStats, InvitationResult, WeddingTexts};
use crate::pipeline::{encode, page, storage::ImageStore, texts};
use crate::prompts::{full_page_plan, tuning_page_plan, PagePlan};
use crate::request::{InvitationRequest, TextRequest, TuningRequest};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Generate invitation copy only (the `/api/generate-text` operation).
pub async fn generate_texts(
    request: &TextRequest,
    config: &WedcardConfig,
) -> Result<WeddingTexts, WedcardError> {
    let model = resolve_text_model(config)?;
    texts::generate_texts(&model, request).await
}

/// Generate a full five-page invitation: cover → greeting → invitation →
/// location → closing.
pub async fn generate_invitation(
    request: &InvitationRequest,
    config: &WedcardConfig,
) -> Result<InvitationResult, WedcardError> {
    request.validate()?;
    let photos = RequestPhotos::sniff(request)?;
    let total_start = Instant::now();

    let text_model = resolve_text_model(config)?;
    let image_model = resolve_image_model(config, request.model_name.as_deref())?;

    // Step 1: invitation copy. Its strings feed every page prompt.
    let text_start = Instant::now();
    let wedding_texts = texts::generate_texts(&text_model, &request.text).await?;
    let text_duration_ms = text_start.elapsed().as_millis() as u64;

    // Step 2: page plan, then the sequential image loop.
    let plan = full_page_plan(request, &wedding_texts);
    let (pages, image_duration_ms) =
        run_page_plan(request, &plan, &image_model, config, &photos).await?;

    let stats = GenerationStats {
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        text_duration_ms,
        image_duration_ms,
        pages_generated: pages.len(),
    };
    info!(
        pages = pages.len(),
        total_ms = stats.total_duration_ms,
        "invitation generated"
    );

    Ok(InvitationResult {
        pages,
        texts: wedding_texts,
        model_used: model_used(config, request.model_name.as_deref()),
        stats,
    })
}

/// Generate the reduced three-page tuning run with optional per-page
/// prompt overrides.
pub async fn generate_invitation_tuning(
    request: &TuningRequest,
    config: &WedcardConfig,
) -> Result<InvitationResult, WedcardError> {
    request.base.validate()?;
    let photos = RequestPhotos::sniff(&request.base)?;
    let total_start = Instant::now();

    let text_model = resolve_text_model(config)?;
    let image_model = resolve_image_model(config, request.base.model_name.as_deref())?;

    let text_start = Instant::now();
    let wedding_texts = texts::generate_texts(&text_model, &request.base.text).await?;
    let text_duration_ms = text_start.elapsed().as_millis() as u64;

    let plan = tuning_page_plan(&request.base, &wedding_texts, &request.prompt_overrides);
    let (pages, image_duration_ms) =
        run_page_plan(&request.base, &plan, &image_model, config, &photos).await?;

    let stats = GenerationStats {
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        text_duration_ms,
        image_duration_ms,
        pages_generated: pages.len(),
    };

    Ok(InvitationResult {
        pages,
        texts: wedding_texts,
        model_used: model_used(config, request.base.model_name.as_deref()),
        stats,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The two uploaded photos, mime-sniffed before any external call so a
/// corrupt upload never costs an API request.
pub(crate) struct RequestPhotos {
    pub wedding: ReferenceImage,
    pub style: ReferenceImage,
}

impl RequestPhotos {
    pub(crate) fn sniff(request: &InvitationRequest) -> Result<Self, WedcardError> {
        Ok(Self {
            wedding: encode::reference_from_bytes(&request.wedding_image, "wedding_image")?,
            style: encode::reference_from_bytes(&request.style_image, "style_image")?,
        })
    }
}

/// Run one page plan sequentially, threading each page's output into the
/// next page's references.
async fn run_page_plan(
    request: &InvitationRequest,
    plan: &[PagePlan],
    image_model: &Arc<dyn ImageModel>,
    config: &WedcardConfig,
    photos: &RequestPhotos,
) -> Result<(Vec<crate::output::InvitationPage>, u64), WedcardError> {
    let store = ImageStore::new(&config.output_dir, &config.public_base_url);
    let total_pages = plan.len();

    let wedding_photo = &photos.wedding;
    let style_photo = &photos.style;

    // The venue map is best-effort: a fetch failure downgrades to a
    // map-less location page rather than failing the request.
    let map_image = fetch_map(request, config).await;

    if let Some(ref progress) = config.progress {
        progress.on_generation_start(total_pages);
    }

    let image_start = Instant::now();
    let mut pages = Vec::with_capacity(total_pages);
    let mut prior: Option<ReferenceImage> = None;

    for (idx, page_plan) in plan.iter().enumerate() {
        let page_num = idx + 1;
        if let Some(ref progress) = config.progress {
            progress.on_page_start(page_num, total_pages);
        }

        let mut references = Vec::new();
        if page_plan.wants_wedding_photo {
            references.push(wedding_photo.clone());
        }
        references.push(style_photo.clone());
        if page_plan.wants_map {
            if let Some(ref map) = map_image {
                references.push(map.clone());
            }
        }

        let outcome = page::generate_page(
            image_model,
            &store,
            page_num,
            page_plan,
            prior.as_ref(),
            &references,
            config.gemini_retry.max_attempts,
        )
        .await;

        match outcome {
            Ok(outcome) => {
                if let Some(ref progress) = config.progress {
                    progress.on_page_complete(page_num, total_pages, &outcome.page.image_url);
                }
                prior = Some(outcome.continuity);
                pages.push(outcome.page);
            }
            Err(err) => {
                if let Some(ref progress) = config.progress {
                    progress.on_page_error(page_num, total_pages, &err.to_string());
                    progress.on_generation_complete(total_pages, pages.len());
                }
                // Abort the remaining pipeline; already-stored pages stay
                // on disk.
                return Err(WedcardError::PageFailed(err));
            }
        }
    }

    if let Some(ref progress) = config.progress {
        progress.on_generation_complete(total_pages, pages.len());
    }

    Ok((pages, image_start.elapsed().as_millis() as u64))
}

/// Fetch the venue map when coordinates and a maps key are both present.
pub(crate) async fn fetch_map(
    request: &InvitationRequest,
    config: &WedcardConfig,
) -> Option<ReferenceImage> {
    let (latitude, longitude) = request.coordinates()?;
    let api_key = config.maps_api_key.as_ref()?;

    let client = match StaticMapClient::new(api_key, config.api_timeout_secs) {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "could not build map client; skipping venue map");
            return None;
        }
    };

    match client.fetch(latitude, longitude, &request.text.venue).await {
        Ok(map) => Some(map),
        Err(err) => {
            warn!(error = %err, "venue map fetch failed; location page will have no map");
            None
        }
    }
}

/// Resolve the text model: injected client first, then a configured key.
pub(crate) fn resolve_text_model(
    config: &WedcardConfig,
) -> Result<Arc<dyn TextModel>, WedcardError> {
    if let Some(ref client) = config.text_client {
        return Ok(Arc::clone(client));
    }
    Ok(Arc::new(GeminiClient::from_config(config)?))
}

/// Resolve the image model: injected client first, then a configured key,
/// honouring a per-request model override.
pub(crate) fn resolve_image_model(
    config: &WedcardConfig,
    model_override: Option<&str>,
) -> Result<Arc<dyn ImageModel>, WedcardError> {
    if let Some(ref client) = config.image_client {
        return Ok(Arc::clone(client));
    }
    let mut client = GeminiClient::from_config(config)?;
    if let Some(model) = model_override {
        client = client.with_image_model(model);
    }
    Ok(Arc::new(client))
}

/// The model id reported back as `model_used`.
fn model_used(config: &WedcardConfig, model_override: Option<&str>) -> String {
    model_override
        .map(|m| m.strip_prefix("models/").unwrap_or(m).to_string())
        .unwrap_or_else(|| config.image_model.clone())
}
