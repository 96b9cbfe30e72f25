//! # wedcard
//!
//! Generate multi-page wedding invitations (and 3D keepsakes) by
//! orchestrating hosted generative models.
//!
//! ## Why this crate?
//!
//! Invitation suites live or die on consistency: the greeting page must
//! look like it belongs to the cover, and the location page to both.
//! Hosted image models have no memory between calls, so this crate makes
//! continuity explicit — every page call re-supplies the previous page's
//! output and the original style reference, and the pipeline runs
//! strictly in page order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request
//!  │
//!  ├─ 1. Validate  required fields, photo formats — before any API call
//!  ├─ 2. Texts     one text-model call → greetings/invitations/location/closing
//!  ├─ 3. Pages     sequential image-model calls, page k−1 output → page k reference
//!  ├─ 4. Store     uuid-named files in the output directory + public URLs
//!  └─ 5. (3D)      optional: submit a page to the image-to-3D provider, poll by task id
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wedcard::{generate_texts, TextRequest, WedcardConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Keys read from GEMINI_API_KEY / MESHY_API_KEY / GOOGLE_MAPS_API_KEY
//!     let config = WedcardConfig::from_env();
//!     let request = TextRequest {
//!         tone: "romantic".into(),
//!         groom_name: "이철수".into(),
//!         bride_name: "김영희".into(),
//!         venue: "더 클래식 500".into(),
//!         wedding_date: "2025년 4월 12일 토요일".into(),
//!         wedding_time: "오후 2시 30분".into(),
//!         ..TextRequest::default()
//!     };
//!     let texts = generate_texts(&request, &config).await?;
//!     println!("{}", texts.greetings[0]);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | REST surface (axum router) and the `wedcard-server` binary |
//!
//! Disable `server` when using only the library to avoid pulling in the
//! HTTP-server stack:
//! ```toml
//! wedcard = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod poll;
pub mod progress;
pub mod prompts;
pub mod request;
pub mod retry;
#[cfg(feature = "server")]
pub mod server;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{WedcardConfig, WedcardConfigBuilder};
pub use error::{PageError, WedcardError};
pub use generate::{generate_invitation, generate_invitation_tuning, generate_texts};
pub use output::{GenerationStats, InvitationPage, InvitationResult, PageKind, WeddingTexts};
pub use poll::{wait_for_job, AsyncJob, JobSource, JobStatus, PollPolicy};
pub use progress::{GenerationProgress, NoopProgress, ProgressHandle};
pub use request::{InvitationRequest, TextRequest, TuningRequest};
pub use retry::RetryPolicy;
pub use stream::{generate_invitation_stream, InvitationStream, PageStream};
