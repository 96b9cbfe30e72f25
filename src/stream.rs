//! Streaming generation API: emit pages as they complete.
//!
//! ## Why stream?
//!
//! A five-page generation takes tens of seconds. A stream-based API lets
//! callers show each card the moment it lands instead of staring at a
//! spinner until the whole invitation is done.
//!
//! Unlike the eager [`crate::generate::generate_invitation`], which
//! returns only after every page finishes,
//! [`generate_invitation_stream`] yields `InvitationPage` items in page
//! order as each completes. The pipeline is sequential by construction
//! (page k needs page k−1's output), so items always arrive in order; a
//! page failure is yielded as the final `Err` item and ends the stream.

use crate::client::{ImageModel, ReferenceImage};
use crate::config::WedcardConfig;
use crate::error::{PageError, WedcardError};
use crate::generate::{fetch_map, resolve_image_model, resolve_text_model};
use crate::output::{InvitationPage, WeddingTexts};
use crate::pipeline::{encode, page, storage::ImageStore, texts};
use crate::prompts::{full_page_plan, PagePlan};
use crate::request::InvitationRequest;
use futures::stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed, ordered stream of page results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<InvitationPage, PageError>> + Send>>;

/// A streaming generation: the copy is ready up front, the pages trickle in.
pub struct InvitationStream {
    /// Invitation copy, generated eagerly before the first page.
    pub texts: WeddingTexts,
    /// Pages in page order; ends early after yielding the first `Err`.
    pub pages: PageStream,
}

/// Start a full five-page generation, streaming pages as they are ready.
///
/// Fatal setup problems (validation, provider configuration, text
/// generation) surface as `Err(WedcardError)` before a stream exists;
/// per-page failures arrive inside the stream.
pub async fn generate_invitation_stream(
    request: InvitationRequest,
    config: &WedcardConfig,
) -> Result<InvitationStream, WedcardError> {
    request.validate()?;

    let text_model = resolve_text_model(config)?;
    let image_model = resolve_image_model(config, request.model_name.as_deref())?;

    let wedding_photo = encode::reference_from_bytes(&request.wedding_image, "wedding_image")?;
    let style_photo = encode::reference_from_bytes(&request.style_image, "style_image")?;

    let wedding_texts = texts::generate_texts(&text_model, &request.text).await?;
    info!("invitation copy ready; streaming pages");

    let map = fetch_map(&request, config).await;

    let plan: VecDeque<(usize, PagePlan)> = full_page_plan(&request, &wedding_texts)
        .into_iter()
        .enumerate()
        .map(|(idx, plan)| (idx + 1, plan))
        .collect();

    let state = StreamState {
        plan,
        prior: None,
        wedding_photo,
        style_photo,
        map,
        model: image_model,
        store: ImageStore::new(&config.output_dir, &config.public_base_url),
        retry_attempts: config.gemini_retry.max_attempts,
        aborted: false,
    };

    let pages = stream::unfold(state, |mut state| async move {
        if state.aborted {
            return None;
        }
        let (page_num, page_plan) = state.plan.pop_front()?;

        let mut references = Vec::new();
        if page_plan.wants_wedding_photo {
            references.push(state.wedding_photo.clone());
        }
        references.push(state.style_photo.clone());
        if page_plan.wants_map {
            if let Some(ref map) = state.map {
                references.push(map.clone());
            }
        }

        let outcome = page::generate_page(
            &state.model,
            &state.store,
            page_num,
            &page_plan,
            state.prior.as_ref(),
            &references,
            state.retry_attempts,
        )
        .await;

        match outcome {
            Ok(outcome) => {
                state.prior = Some(outcome.continuity);
                Some((Ok(outcome.page), state))
            }
            Err(err) => {
                state.aborted = true;
                Some((Err(err), state))
            }
        }
    });

    Ok(InvitationStream {
        texts: wedding_texts,
        pages: Box::pin(pages),
    })
}

struct StreamState {
    plan: VecDeque<(usize, PagePlan)>,
    prior: Option<ReferenceImage>,
    wedding_photo: ReferenceImage,
    style_photo: ReferenceImage,
    map: Option<ReferenceImage>,
    model: Arc<dyn ImageModel>,
    store: ImageStore,
    retry_attempts: u32,
    aborted: bool,
}
