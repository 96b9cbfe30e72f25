//! Google Generative Language API client (text + image generation).
//!
//! One client serves both model traits: invitation copy comes from a text
//! model asked for a JSON payload, page artwork comes from an image model
//! asked for inline image data. The wire format is the REST `v1beta`
//! `models/{model}:generateContent` shape — camelCase field names, images
//! as base64 `inlineData` parts interleaved with the prompt text.
//!
//! Transient failures (transport errors, HTTP 429/5xx) are retried under
//! the injected [`RetryPolicy`]; 4xx business errors surface immediately
//! as [`WedcardError::ProviderRejected`].

use crate::client::{GeneratedImage, ImageModel, ReferenceImage, TextModel};
use crate::config::WedcardConfig;
use crate::error::WedcardError;
use crate::retry::{with_retry, CallFailure, RetryPolicy};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the text/image generation provider.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    aspect_ratio: String,
    image_size: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Build a client from the service config.
    ///
    /// Fails with [`WedcardError::ProviderNotConfigured`] when no API key
    /// is present, so the miss is reported before any pipeline work starts.
    pub fn from_config(config: &WedcardConfig) -> Result<Self, WedcardError> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or(WedcardError::ProviderNotConfigured {
                provider: "gemini",
                env_var: "GEMINI_API_KEY",
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| WedcardError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: normalise_model(&config.text_model),
            image_model: normalise_model(&config.image_model),
            aspect_ratio: config.aspect_ratio.clone(),
            image_size: config.image_size.clone(),
            retry: config.gemini_retry,
        })
    }

    /// Point the client at a different endpoint (local test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the image model for one request ("model_name" form field).
    pub fn with_image_model(mut self, model: &str) -> Self {
        self.image_model = normalise_model(model);
        self
    }

    /// Image model id currently in use (reported back as `model_used`).
    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse, WedcardError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        with_retry(&self.retry, "gemini", |attempt| {
            let url = url.clone();
            async move {
                debug!(model, attempt, "calling generateContent");
                let response = self
                    .http
                    .post(&url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(request)
                    .send()
                    .await
                    .map_err(CallFailure::Transport)?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CallFailure::Status { status, body });
                }

                response
                    .json::<GenerateContentResponse>()
                    .await
                    .map_err(CallFailure::Transport)
            }
        })
        .await
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, WedcardError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part::text(prompt)],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json"),
                response_modalities: None,
                image_config: None,
            }),
        };

        let response = self.generate_content(&self.text_model, &request).await?;
        let text = response.concatenated_text();
        if text.trim().is_empty() {
            return Err(WedcardError::EmptyModelPayload {
                provider: "gemini",
                detail: "no text part in response".into(),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl ImageModel for GeminiClient {
    async fn generate_image(
        &self,
        prompt: &str,
        references: &[ReferenceImage],
    ) -> Result<GeneratedImage, WedcardError> {
        let mut parts = vec![Part::text(prompt)];
        for reference in references {
            parts.push(Part::inline(&reference.mime_type, &reference.data));
        }

        let request = GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: Some(GenerationConfig {
                response_mime_type: None,
                response_modalities: Some(vec!["TEXT", "IMAGE"]),
                image_config: Some(ImageConfig {
                    aspect_ratio: &self.aspect_ratio,
                    image_size: &self.image_size,
                }),
            }),
        };

        let response = self.generate_content(&self.image_model, &request).await?;

        let inline = response.first_inline_data().ok_or_else(|| {
            // 200 with no image part — the open-question case; reported as
            // its own error kind, with the model's text (if any) as detail.
            let text = response.concatenated_text();
            WedcardError::EmptyModelPayload {
                provider: "gemini",
                detail: if text.is_empty() {
                    "no image part in response".into()
                } else {
                    format!("model returned text instead of an image: {}", text)
                },
            }
        })?;

        let data = STANDARD.decode(&inline.data).map_err(|e| {
            WedcardError::EmptyModelPayload {
                provider: "gemini",
                detail: format!("image part is not valid base64: {e}"),
            }
        })?;

        Ok(GeneratedImage {
            mime_type: inline
                .mime_type
                .clone()
                .unwrap_or_else(|| "image/png".to_string()),
            data,
        })
    }
}

/// Accept both "gemini-..." and the SDK's "models/gemini-..." spelling.
fn normalise_model(model: &str) -> String {
    model.strip_prefix("models/").unwrap_or(model).to_string()
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl<'a> Part<'a> {
    fn text(text: &'a str) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }

    fn inline(mime_type: &str, data: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: STANDARD.encode(data),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig<'a> {
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
    #[serde(rename = "imageConfig", skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct ImageConfig<'a> {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: &'a str,
    #[serde(rename = "imageSize")]
    image_size: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// All text parts of the first candidate, joined with newlines.
    fn concatenated_text(&self) -> String {
        let mut texts = Vec::new();
        for candidate in &self.candidates {
            for part in candidate.parts() {
                if let Some(ref text) = part.text {
                    if !text.is_empty() {
                        texts.push(text.as_str());
                    }
                }
            }
        }
        texts.join("\n")
    }

    fn first_inline_data(&self) -> Option<&ResponseInline> {
        self.candidates
            .iter()
            .flat_map(|c| c.parts())
            .find_map(|p| p.inline_data.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

impl Candidate {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.content.iter().flat_map(|c| c.parts.iter())
    }
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<ResponseInline>,
}

#[derive(Debug, Deserialize)]
struct ResponseInline {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    data: String,
}
