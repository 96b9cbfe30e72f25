//! Meshy image-to-3D API client.
//!
//! Two operations: create a task from a base64 data-URI image, and read a
//! task snapshot. Both run under the injected [`RetryPolicy`] — the Meshy
//! endpoint is the one provider where transport flakiness (TLS resets,
//! 5xx bursts) is common enough that the default is 5 attempts, applied
//! uniformly to every request.
//!
//! Upstream reports a fifth status, "CANCELED"; it is folded into
//! [`JobStatus::Failed`] here so the rest of the crate only handles the
//! four-state machine.

use crate::config::WedcardConfig;
use crate::error::WedcardError;
use crate::poll::{AsyncJob, JobSource, JobStatus, ModelUrls, TaskError};
use crate::retry::{with_retry, CallFailure, RetryPolicy};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://api.meshy.ai/openapi/v1";

/// Client for the image-to-3D provider.
#[derive(Debug, Clone)]
pub struct MeshyClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

/// Task creation options, tuned for web-viewer output: remeshed triangle
/// topology, texture on, PBR off.
#[derive(Debug, Clone, Serialize)]
pub struct MeshyTaskOptions {
    pub ai_model: String,
    pub should_texture: bool,
    pub enable_pbr: bool,
    pub should_remesh: bool,
    pub topology: String,
    pub target_polycount: u32,
    pub symmetry_mode: String,
}

impl Default for MeshyTaskOptions {
    fn default() -> Self {
        Self {
            ai_model: "latest".to_string(),
            should_texture: true,
            enable_pbr: false,
            should_remesh: true,
            topology: "triangle".to_string(),
            target_polycount: 100_000,
            symmetry_mode: "auto".to_string(),
        }
    }
}

impl MeshyClient {
    /// Build a client from the service config.
    pub fn from_config(config: &WedcardConfig) -> Result<Self, WedcardError> {
        let api_key = config
            .meshy_api_key
            .clone()
            .ok_or(WedcardError::ProviderNotConfigured {
                provider: "meshy",
                env_var: "MESHY_API_KEY",
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| WedcardError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: config.meshy_retry,
        })
    }

    /// Point the client at a different endpoint (local test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Submit an image-to-3D task. `image_data_uri` must be a
    /// `data:image/...;base64,...` payload (see
    /// [`crate::pipeline::encode::to_data_uri`]).
    ///
    /// Returns the opaque task id to poll with [`JobSource::snapshot`].
    pub async fn create_image_to_3d(
        &self,
        image_data_uri: &str,
        options: &MeshyTaskOptions,
    ) -> Result<String, WedcardError> {
        let url = format!("{}/image-to-3d", self.base_url);
        let payload = CreateTaskRequest {
            image_url: image_data_uri,
            options,
        };

        let response: CreateTaskResponse = with_retry(&self.retry, "meshy", |attempt| {
            let url = url.clone();
            let payload = &payload;
            async move {
                debug!(attempt, "creating image-to-3d task");
                let response = self
                    .http
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(payload)
                    .send()
                    .await
                    .map_err(CallFailure::Transport)?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CallFailure::Status { status, body });
                }

                response
                    .json::<CreateTaskResponse>()
                    .await
                    .map_err(CallFailure::Transport)
            }
        })
        .await?;

        if response.result.is_empty() {
            return Err(WedcardError::EmptyModelPayload {
                provider: "meshy",
                detail: "task created but no task id returned".into(),
            });
        }

        info!(task_id = %response.result, "image-to-3d task created");
        Ok(response.result)
    }
}

#[async_trait]
impl JobSource for MeshyClient {
    async fn snapshot(&self, task_id: &str) -> Result<AsyncJob, WedcardError> {
        let url = format!("{}/image-to-3d/{}", self.base_url, task_id);

        let task: TaskResponse = with_retry(&self.retry, "meshy", |_attempt| {
            let url = url.clone();
            async move {
                let response = self
                    .http
                    .get(&url)
                    .bearer_auth(&self.api_key)
                    .send()
                    .await
                    .map_err(CallFailure::Transport)?;

                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    return Err(CallFailure::Permanent(WedcardError::UnknownTask {
                        task_id: task_id.to_string(),
                    }));
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(CallFailure::Status { status, body });
                }

                response
                    .json::<TaskResponse>()
                    .await
                    .map_err(CallFailure::Transport)
            }
        })
        .await?;

        Ok(task.into_job(task_id))
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateTaskRequest<'a> {
    image_url: &'a str,
    #[serde(flatten)]
    options: &'a MeshyTaskOptions,
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    #[serde(default)]
    result: String,
}

#[derive(Debug, Deserialize)]
struct TaskResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    progress: u8,
    model_urls: Option<ModelUrls>,
    task_error: Option<TaskError>,
}

impl TaskResponse {
    fn into_job(self, fallback_id: &str) -> AsyncJob {
        let (status, task_error) = match self.status.as_str() {
            "PENDING" => (JobStatus::Pending, self.task_error),
            "IN_PROGRESS" => (JobStatus::InProgress, self.task_error),
            "SUCCEEDED" => (JobStatus::Succeeded, self.task_error),
            "FAILED" => (JobStatus::Failed, self.task_error),
            "CANCELED" => (
                JobStatus::Failed,
                self.task_error.or(Some(TaskError {
                    message: "task canceled upstream".to_string(),
                })),
            ),
            // Unknown spellings stay non-terminal; the poll bound caps the
            // damage if upstream invents a new terminal state.
            _ => (JobStatus::Pending, self.task_error),
        };

        AsyncJob {
            id: if self.id.is_empty() {
                fallback_id.to_string()
            } else {
                self.id
            },
            status,
            progress: self.progress.min(100),
            model_urls: self.model_urls,
            task_error,
        }
    }
}
