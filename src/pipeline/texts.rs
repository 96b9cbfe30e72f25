//! Text stage: one text-model call producing the invitation copy.
//!
//! The model is asked for the full `WeddingTexts` schema in a single
//! call — three greeting variants, three invitations, one location blurb,
//! three closings. The raw payload goes through
//! [`crate::pipeline::postprocess::extract_json_object`] before
//! deserialising, so fenced or commentary-wrapped JSON still parses.

use crate::client::TextModel;
use crate::error::WedcardError;
use crate::output::WeddingTexts;
use crate::pipeline::postprocess;
use crate::prompts;
use crate::request::TextRequest;
use std::sync::Arc;
use tracing::{debug, info};

/// Generate invitation copy for a validated request.
///
/// An incomplete payload (any section empty or blank) is reported as
/// [`WedcardError::EmptyModelPayload`] rather than passed downstream —
/// every later page prompt embeds one of these strings, so a hole here
/// would propagate into the artwork.
pub async fn generate_texts(
    model: &Arc<dyn TextModel>,
    request: &TextRequest,
) -> Result<WeddingTexts, WedcardError> {
    request.validate()?;

    let prompt = prompts::text_generation_prompt(request);
    debug!(tone = %request.tone, "requesting invitation copy");

    let raw = model.generate_text(&prompt).await?;
    let value = postprocess::extract_json_object(&raw)?;
    let texts: WeddingTexts =
        serde_json::from_value(value).map_err(|e| WedcardError::MalformedModelOutput {
            detail: format!("payload does not match the text schema: {e}"),
        })?;

    if !texts.is_complete() {
        return Err(WedcardError::EmptyModelPayload {
            provider: "gemini",
            detail: "text payload is missing one or more sections".into(),
        });
    }

    info!(
        greetings = texts.greetings.len(),
        invitations = texts.invitations.len(),
        closings = texts.closing.len(),
        "invitation copy generated"
    );
    Ok(texts)
}
