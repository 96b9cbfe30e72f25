//! Error types for the wedcard library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`WedcardError`] — **Fatal**: the generation cannot proceed at all
//!   (missing required fields, provider not configured, storage failure,
//!   poll budget exhausted). Returned as `Err(WedcardError)` from the
//!   top-level `generate_*` functions.
//!
//! * [`PageError`] — **Per-page**: one invitation page failed (model call
//!   exhausted its retries, or the provider answered 200 with no image
//!   part). Because the pipeline feeds each page's output into the next
//!   page as a continuity reference, a page failure aborts the remaining
//!   pages — but the error still records *which* page died and why, and
//!   the streaming API yields it as the last item.
//!
//! The separation keeps the HTTP layer simple: fatal errors map to the
//! common `{success:false, error, detail, traceback}` response, with the
//! source chain rendered into `traceback`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the wedcard library.
///
/// Page-level failures use [`PageError`]; they are wrapped into
/// [`WedcardError::PageFailed`] when they abort a full generation.
#[derive(Debug, Error)]
pub enum WedcardError {
    // ── Request errors ────────────────────────────────────────────────────
    /// One or more required request fields were absent or empty.
    ///
    /// Raised by validation before any external call is made.
    #[error("missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// An uploaded reference image could not be decoded as PNG or JPEG.
    #[error("unsupported reference image ({field}): not a PNG or JPEG")]
    UnsupportedImage { field: &'static str },

    // ── Provider errors ───────────────────────────────────────────────────
    /// A required API key is not configured.
    #[error("provider '{provider}' is not configured: set {env_var}")]
    ProviderNotConfigured {
        provider: &'static str,
        env_var: &'static str,
    },

    /// The provider rejected the request with a non-retryable business
    /// error (4xx other than 429, content-policy refusal, bad model name).
    #[error("{provider} rejected the request: {message}")]
    ProviderRejected { provider: &'static str, message: String },

    /// A transient failure (connect/timeout, HTTP 429/5xx) that survived
    /// every retry attempt.
    #[error("{provider} unavailable after {attempts} attempts: {detail}")]
    ProviderUnavailable {
        provider: &'static str,
        attempts: u32,
        detail: String,
    },

    /// The provider answered with a success status but the payload carried
    /// no usable content (no text part, no image part, no task id).
    ///
    /// Kept distinct from [`WedcardError::ProviderRejected`] so callers can
    /// tell "the model refused" apart from "the response was hollow".
    #[error("{provider} returned an empty payload: {detail}")]
    EmptyModelPayload { provider: &'static str, detail: String },

    /// The model's text payload could not be parsed into the expected JSON
    /// shape even after cleanup.
    #[error("could not parse model output as JSON: {detail}")]
    MalformedModelOutput { detail: String },

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// A page call failed, aborting the remaining pipeline.
    #[error(transparent)]
    PageFailed(#[from] PageError),

    // ── Job / polling errors ──────────────────────────────────────────────
    /// No task with the given id exists upstream.
    #[error("unknown task id: {task_id}")]
    UnknownTask { task_id: String },

    /// The job did not reach a terminal state within the poll budget.
    #[error("task {task_id} still {status} after {polls} polls ({elapsed_secs}s); giving up")]
    PollTimeout {
        task_id: String,
        status: String,
        polls: u32,
        elapsed_secs: u64,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write a generated image into the output directory.
    #[error("failed to write generated file '{path}': {source}")]
    StorageFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local image given to the 3D endpoint does not exist.
    #[error("image file not found: '{path}'")]
    ImageNotFound { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WedcardError {
    /// Render the error source chain, outermost first, one frame per line.
    ///
    /// This is what the HTTP layer puts in the `traceback` field of the
    /// common error response.
    pub fn traceback(&self) -> String {
        let mut frames = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            frames.push(err.to_string());
            source = err.source();
        }
        frames.join("\n")
    }
}

/// A failure confined to one invitation page.
///
/// Carried inside [`WedcardError::PageFailed`] and yielded directly by the
/// streaming API so callers can see which page broke the chain.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The image model call failed after all retries.
    #[error("page {page} ({kind}): image call failed after {retries} retries: {detail}")]
    ModelFailed {
        page: usize,
        kind: String,
        retries: u32,
        detail: String,
    },

    /// The model answered successfully but the response held no image part.
    #[error("page {page} ({kind}): model returned no image data")]
    EmptyPayload { page: usize, kind: String },

    /// The generated image could not be written to the output directory.
    #[error("page {page} ({kind}): could not store image: {detail}")]
    StoreFailed {
        page: usize,
        kind: String,
        detail: String,
    },
}

impl PageError {
    /// 1-based page number this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::ModelFailed { page, .. }
            | PageError::EmptyPayload { page, .. }
            | PageError::StoreFailed { page, .. } => *page,
        }
    }
}
