//! Page stage: build one invitation page via the image model.
//!
//! This module converts a [`PagePlan`] plus its reference images into an
//! image-model call and a stored page. It is intentionally thin — prompt
//! wording lives in [`crate::prompts`] and retry/backoff lives in the
//! client, so this stage only assembles the call and classifies failures.
//!
//! ## Message Layout
//!
//! The request contains (in order):
//! 1. **Prompt text** — the page template (plus the continuity suffix for
//!    pages after the first)
//! 2. **Previous page image** *(pages ≥ 2)* — page k−1's output, so the
//!    model reproduces its background texture, border, palette, and font
//! 3. **Further references** — the style photo always; the couple's photo
//!    on the cover; the venue map on the location page

use crate::client::{ImageModel, ReferenceImage};
use crate::error::{PageError, WedcardError};
use crate::output::InvitationPage;
use crate::pipeline::storage::ImageStore;
use crate::prompts::{PagePlan, STYLE_CONTINUITY_SUFFIX};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// A finished page plus the raw bytes the next page needs as its
/// continuity reference.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub page: InvitationPage,
    /// The stored image, kept in memory to feed page k+1.
    pub continuity: ReferenceImage,
}

/// Generate, store, and describe one page.
///
/// `retry_attempts` is only for error reporting — the retry loop itself
/// runs inside the client under its injected policy.
pub async fn generate_page(
    model: &Arc<dyn ImageModel>,
    store: &ImageStore,
    page_num: usize,
    plan: &PagePlan,
    prior_image: Option<&ReferenceImage>,
    references: &[ReferenceImage],
    retry_attempts: u32,
) -> Result<PageOutcome, PageError> {
    let start = Instant::now();
    let kind = plan.kind.as_str();

    let prompt = match prior_image {
        Some(_) => format!("{}{}", plan.prompt, STYLE_CONTINUITY_SUFFIX),
        None => plan.prompt.clone(),
    };

    let mut attached: Vec<ReferenceImage> = Vec::with_capacity(references.len() + 1);
    if let Some(prior) = prior_image {
        attached.push(prior.clone());
    }
    attached.extend_from_slice(references);

    debug!(page_num, kind, references = attached.len(), "generating page");

    let generated = model
        .generate_image(&prompt, &attached)
        .await
        .map_err(|err| match err {
            WedcardError::EmptyModelPayload { .. } => PageError::EmptyPayload {
                page: page_num,
                kind: kind.to_string(),
            },
            other => PageError::ModelFailed {
                page: page_num,
                kind: kind.to_string(),
                retries: retry_attempts,
                detail: other.to_string(),
            },
        })?;

    let stored = store
        .save(&generated, kind)
        .await
        .map_err(|err| PageError::StoreFailed {
            page: page_num,
            kind: kind.to_string(),
            detail: err.to_string(),
        })?;

    info!(
        page_num,
        kind,
        url = %stored.url,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "page generated"
    );

    Ok(PageOutcome {
        page: InvitationPage {
            page_number: page_num,
            image_url: stored.url,
            kind: plan.kind,
            description: Some(plan.description.to_string()),
        },
        continuity: ReferenceImage {
            mime_type: generated.mime_type,
            data: generated.data,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GeneratedImage;
    use crate::output::PageKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the prompt and references of every call.
    struct RecordingModel {
        calls: Mutex<Vec<(String, usize)>>,
        fail_with: Option<fn() -> WedcardError>,
    }

    impl RecordingModel {
        fn ok() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }
    }

    #[async_trait]
    impl ImageModel for RecordingModel {
        async fn generate_image(
            &self,
            prompt: &str,
            references: &[ReferenceImage],
        ) -> Result<GeneratedImage, WedcardError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), references.len()));
            if let Some(make_err) = self.fail_with {
                return Err(make_err());
            }
            Ok(GeneratedImage {
                mime_type: "image/png".into(),
                data: vec![1, 2, 3],
            })
        }
    }

    fn plan() -> PagePlan {
        PagePlan {
            kind: PageKind::Greeting,
            description: "인사말",
            prompt: "Wedding invitation greeting page.".into(),
            wants_wedding_photo: false,
            wants_map: false,
        }
    }

    fn style() -> ReferenceImage {
        ReferenceImage {
            mime_type: "image/png".into(),
            data: vec![9, 9, 9],
        }
    }

    #[tokio::test]
    async fn first_page_has_no_continuity_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), "http://localhost:8000");
        let model_impl = Arc::new(RecordingModel::ok());
        let model: Arc<dyn ImageModel> = model_impl.clone();

        generate_page(&model, &store, 1, &plan(), None, &[style()], 3)
            .await
            .unwrap();

        let calls = model_impl.calls.lock().unwrap();
        assert!(!calls[0].0.contains("previous page"));
        assert_eq!(calls[0].1, 1);
    }

    #[tokio::test]
    async fn later_pages_lead_with_the_prior_image() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), "http://localhost:8000");
        let model_impl = Arc::new(RecordingModel::ok());
        let model: Arc<dyn ImageModel> = model_impl.clone();
        let prior = ReferenceImage {
            mime_type: "image/png".into(),
            data: vec![7],
        };

        let outcome = generate_page(&model, &store, 2, &plan(), Some(&prior), &[style()], 3)
            .await
            .unwrap();

        let calls = model_impl.calls.lock().unwrap();
        assert!(calls[0].0.contains("previous page"));
        assert_eq!(calls[0].1, 2, "prior + style");
        assert_eq!(outcome.page.page_number, 2);
        assert_eq!(outcome.continuity.data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn empty_payload_maps_to_page_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), "http://localhost:8000");
        let model: Arc<dyn ImageModel> = Arc::new(RecordingModel {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(|| WedcardError::EmptyModelPayload {
                provider: "gemini",
                detail: "no image part".into(),
            }),
        });

        let err = generate_page(&model, &store, 3, &plan(), None, &[], 3)
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::EmptyPayload { page: 3, .. }));
    }
}
