//! Configuration for the generation service.
//!
//! All behaviour is controlled through [`WedcardConfig`], built via its
//! [`WedcardConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share the config across handlers, log it on startup, and
//! diff two runs to understand why their outputs differ.
//!
//! There are deliberately no ambient singletons: API keys and the output
//! directory are read from the environment exactly once (in
//! [`WedcardConfig::from_env`] or the server binary) and passed into the
//! clients at construction time.

use crate::client::{ImageModel, TextModel};
use crate::error::WedcardError;
use crate::poll::PollPolicy;
use crate::progress::GenerationProgress;
use crate::retry::RetryPolicy;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for invitation and 3D generation.
///
/// Built via [`WedcardConfig::builder()`] or [`WedcardConfig::from_env()`].
///
/// # Example
/// ```rust
/// use wedcard::WedcardConfig;
///
/// let config = WedcardConfig::builder()
///     .output_dir("/tmp/wedcard-out")
///     .public_base_url("http://localhost:8000")
///     .gemini_api_key("test-key")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct WedcardConfig {
    /// Directory generated images are written into. Created on demand.
    ///
    /// Files are named `{kind}_{uuid}.{ext}`, so concurrent requests
    /// sharing the directory never collide.
    pub output_dir: PathBuf,

    /// Base URL minted into returned image URLs, e.g. "http://localhost:8000".
    ///
    /// The server mounts `output_dir` under `/static/generated`, so a saved
    /// file `cover_<uuid>.png` becomes
    /// `{public_base_url}/static/generated/cover_<uuid>.png`.
    pub public_base_url: String,

    /// API key for the text/image generation provider (`GEMINI_API_KEY`).
    pub gemini_api_key: Option<String>,

    /// API key for the image-to-3D provider (`MESHY_API_KEY`).
    pub meshy_api_key: Option<String>,

    /// API key for static venue maps (`GOOGLE_MAPS_API_KEY`). Optional:
    /// without it the location page simply carries no map reference.
    pub maps_api_key: Option<String>,

    /// Text generation model id. Default: "gemini-2.0-flash-exp".
    pub text_model: String,

    /// Image generation model id. Default: "gemini-3-pro-image-preview".
    pub image_model: String,

    /// Aspect ratio requested for every page image. Default: "3:4".
    pub aspect_ratio: String,

    /// Output resolution tier requested from the image model. Default: "2K".
    pub image_size: String,

    /// Retry policy for the text/image provider. Default: 3 attempts, 500 ms base.
    pub gemini_retry: RetryPolicy,

    /// Retry policy for the 3D provider. Default: 5 attempts, 1 s base.
    ///
    /// The higher bound matches observed transport flakiness on that
    /// endpoint; it applies uniformly to task creation and status reads.
    pub meshy_retry: RetryPolicy,

    /// Poll interval and attempt bound for [`crate::poll::wait_for_job`].
    ///
    /// The bound is explicit so a stuck upstream job cannot pin a caller
    /// forever. Default: 3 s interval, 200 polls (10 minutes).
    pub poll: PollPolicy,

    /// Per-request timeout for provider HTTP calls, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Pre-constructed text model. Takes precedence over `gemini_api_key`.
    /// Mainly for tests and callers that need custom middleware.
    pub text_client: Option<Arc<dyn TextModel>>,

    /// Pre-constructed image model. Takes precedence over `gemini_api_key`.
    pub image_client: Option<Arc<dyn ImageModel>>,

    /// Per-page progress events. `None` disables reporting.
    pub progress: Option<Arc<dyn GenerationProgress>>,
}

impl Default for WedcardConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("static/generated"),
            public_base_url: "http://localhost:8000".to_string(),
            gemini_api_key: None,
            meshy_api_key: None,
            maps_api_key: None,
            text_model: "gemini-2.0-flash-exp".to_string(),
            image_model: "gemini-3-pro-image-preview".to_string(),
            aspect_ratio: "3:4".to_string(),
            image_size: "2K".to_string(),
            gemini_retry: RetryPolicy::gemini_default(),
            meshy_retry: RetryPolicy::meshy_default(),
            poll: PollPolicy::default(),
            api_timeout_secs: 60,
            text_client: None,
            image_client: None,
            progress: None,
        }
    }
}

impl fmt::Debug for WedcardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WedcardConfig")
            .field("output_dir", &self.output_dir)
            .field("public_base_url", &self.public_base_url)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<set>"))
            .field("meshy_api_key", &self.meshy_api_key.as_ref().map(|_| "<set>"))
            .field("maps_api_key", &self.maps_api_key.as_ref().map(|_| "<set>"))
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("image_size", &self.image_size)
            .field("gemini_retry", &self.gemini_retry)
            .field("meshy_retry", &self.meshy_retry)
            .field("poll", &self.poll)
            .field("text_client", &self.text_client.as_ref().map(|_| "<dyn TextModel>"))
            .field("image_client", &self.image_client.as_ref().map(|_| "<dyn ImageModel>"))
            .finish()
    }
}

impl WedcardConfig {
    /// Create a new builder.
    pub fn builder() -> WedcardConfigBuilder {
        WedcardConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from the process environment.
    ///
    /// Reads `GEMINI_API_KEY`, `MESHY_API_KEY`, and `GOOGLE_MAPS_API_KEY`;
    /// absent keys stay `None` and the corresponding feature fails with
    /// [`WedcardError::ProviderNotConfigured`] only when actually used.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            meshy_api_key: non_empty("MESHY_API_KEY"),
            maps_api_key: non_empty("GOOGLE_MAPS_API_KEY"),
            ..Self::default()
        }
    }
}

/// Builder for [`WedcardConfig`].
pub struct WedcardConfigBuilder {
    config: WedcardConfig,
}

impl WedcardConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.public_base_url = url.into();
        self
    }

    pub fn gemini_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini_api_key = Some(key.into());
        self
    }

    pub fn meshy_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.meshy_api_key = Some(key.into());
        self
    }

    pub fn maps_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.maps_api_key = Some(key.into());
        self
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = model.into();
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    pub fn aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.config.aspect_ratio = ratio.into();
        self
    }

    pub fn image_size(mut self, size: impl Into<String>) -> Self {
        self.config.image_size = size.into();
        self
    }

    pub fn gemini_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.gemini_retry = policy;
        self
    }

    pub fn meshy_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.meshy_retry = policy;
        self
    }

    pub fn poll(mut self, policy: PollPolicy) -> Self {
        self.config.poll = policy;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn text_client(mut self, client: Arc<dyn TextModel>) -> Self {
        self.config.text_client = Some(client);
        self
    }

    pub fn image_client(mut self, client: Arc<dyn ImageModel>) -> Self {
        self.config.image_client = Some(client);
        self
    }

    pub fn progress(mut self, progress: Arc<dyn GenerationProgress>) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WedcardConfig, WedcardError> {
        let c = &self.config;
        if c.output_dir.as_os_str().is_empty() {
            return Err(WedcardError::InvalidConfig(
                "output_dir must not be empty".into(),
            ));
        }
        if c.public_base_url.is_empty() || c.public_base_url.ends_with('/') {
            return Err(WedcardError::InvalidConfig(format!(
                "public_base_url must be non-empty without a trailing slash, got '{}'",
                c.public_base_url
            )));
        }
        if c.gemini_retry.max_attempts == 0 || c.meshy_retry.max_attempts == 0 {
            return Err(WedcardError::InvalidConfig(
                "retry max_attempts must be ≥ 1".into(),
            ));
        }
        if c.poll.max_polls == 0 {
            return Err(WedcardError::InvalidConfig(
                "poll max_polls must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = WedcardConfig::builder().build().unwrap();
        assert_eq!(config.text_model, "gemini-2.0-flash-exp");
        assert_eq!(config.gemini_retry.max_attempts, 3);
        assert_eq!(config.meshy_retry.max_attempts, 5);
    }

    #[test]
    fn trailing_slash_base_url_rejected() {
        let result = WedcardConfig::builder()
            .public_base_url("http://localhost:8000/")
            .build();
        assert!(matches!(result, Err(WedcardError::InvalidConfig(_))));
    }

    #[test]
    fn zero_poll_budget_rejected() {
        let result = WedcardConfig::builder()
            .poll(PollPolicy {
                interval_ms: 1000,
                max_polls: 0,
            })
            .build();
        assert!(matches!(result, Err(WedcardError::InvalidConfig(_))));
    }

    #[test]
    fn debug_redacts_keys() {
        let config = WedcardConfig::builder()
            .gemini_api_key("super-secret")
            .build()
            .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<set>"));
    }
}
