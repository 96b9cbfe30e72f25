//! Request handlers for the REST surface.
//!
//! Handlers stay thin: decode, validate, delegate to the library, wrap
//! the result. Multipart decoding collects the known field names and
//! ignores unknown ones, so older front-ends that send extra fields keep
//! working.

use crate::client::meshy::MeshyClient;
use crate::generate;
use crate::pipeline::encode;
use crate::poll::{AsyncJob, JobSource};
use crate::request::{InvitationRequest, TextRequest, TuningRequest};
use crate::server::types::{ApiError, ApiSuccess, Generate3dRequest, Generate3dResponse};
use crate::server::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{info, warn};

// ── Health ───────────────────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

// ── Text generation ──────────────────────────────────────────────────────

pub async fn generate_text(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Json<ApiSuccess<crate::output::WeddingTexts>>, ApiError> {
    let texts = generate::generate_texts(&request, &state.config).await?;
    Ok(Json(ApiSuccess::new(texts)))
}

// ── Invitation generation ────────────────────────────────────────────────

pub async fn generate_invitation(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiSuccess<crate::output::InvitationResult>>, ApiError> {
    let form = InvitationForm::collect(multipart).await?;
    let request = form.request;
    let result = generate::generate_invitation(&request, &state.config).await?;
    Ok(Json(ApiSuccess::new(result)))
}

pub async fn generate_invitation_test(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ApiSuccess<crate::output::InvitationResult>>, ApiError> {
    let form = InvitationForm::collect(multipart).await?;
    if let Some(model_type) = &form.model_type {
        info!(%model_type, "tuning run requested");
    }
    let request = TuningRequest {
        base: form.request,
        prompt_overrides: form.prompt_overrides,
    };
    let result = generate::generate_invitation_tuning(&request, &state.config).await?;
    Ok(Json(ApiSuccess::new(result)))
}

// ── 3D generation ────────────────────────────────────────────────────────

pub async fn generate_3d(
    State(state): State<AppState>,
    Json(request): Json<Generate3dRequest>,
) -> Result<Json<Generate3dResponse>, ApiError> {
    let path = PathBuf::from(&request.image_path);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| crate::error::WedcardError::ImageNotFound { path: path.clone() })?;

    let data_uri = encode::to_data_uri(&bytes, "image_path")?;
    let client = MeshyClient::from_config(&state.config)?;
    let options = crate::client::meshy::MeshyTaskOptions::default();
    let task_id = client.create_image_to_3d(&data_uri, &options).await?;

    // Echo the payload minus the image itself, which would dwarf the log.
    let logs = json!({
        "request_payload": options,
        "image_path": request.image_path,
    });
    Ok(Json(Generate3dResponse { task_id, logs }))
}

pub async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<AsyncJob>, ApiError> {
    let client = MeshyClient::from_config(&state.config)?;
    let job = client.snapshot(&task_id).await?;
    Ok(Json(job))
}

// ── Multipart decoding ───────────────────────────────────────────────────

/// The collected multipart form of the two invitation endpoints.
struct InvitationForm {
    request: InvitationRequest,
    model_type: Option<String>,
    prompt_overrides: [Option<String>; 3],
}

impl InvitationForm {
    async fn collect(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut request = InvitationRequest::default();
        let mut model_type = None;
        let mut prompt_overrides: [Option<String>; 3] = [None, None, None];

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "wedding_image" => {
                    request.wedding_image =
                        field.bytes().await.map_err(bad_multipart)?.to_vec();
                }
                "style_image" => {
                    request.style_image = field.bytes().await.map_err(bad_multipart)?.to_vec();
                }
                other => {
                    let text = field.text().await.map_err(bad_multipart)?;
                    match other {
                        "tone" => request.text.tone = text,
                        "groom_name" => request.text.groom_name = text,
                        "bride_name" => request.text.bride_name = text,
                        "groom_father" => request.text.groom_father = text,
                        "groom_mother" => request.text.groom_mother = text,
                        "bride_father" => request.text.bride_father = text,
                        "bride_mother" => request.text.bride_mother = text,
                        "venue" => request.text.venue = text,
                        "wedding_date" => request.text.wedding_date = text,
                        "wedding_time" => request.text.wedding_time = text,
                        "address" => request.text.address = text,
                        "floor_hall" => request.floor_hall = text,
                        "border_design_id" => request.border_design_id = Some(text),
                        "model_name" => request.model_name = Some(text),
                        "model_type" => model_type = Some(text),
                        "latitude" => request.latitude = parse_coord(&text, "latitude")?,
                        "longitude" => request.longitude = parse_coord(&text, "longitude")?,
                        "prompt_override_1" => prompt_overrides[0] = Some(text),
                        "prompt_override_2" => prompt_overrides[1] = Some(text),
                        "prompt_override_3" => prompt_overrides[2] = Some(text),
                        unknown => {
                            warn!(field = unknown, "ignoring unknown form field");
                        }
                    }
                }
            }
        }

        Ok(Self {
            request,
            model_type,
            prompt_overrides,
        })
    }
}

fn parse_coord(text: &str, field: &str) -> Result<Option<f64>, ApiError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    text.trim().parse::<f64>().map(Some).map_err(|_| {
        crate::error::WedcardError::MissingFields {
            fields: vec![format!("{field} (not a number)")],
        }
        .into()
    })
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        body: crate::server::types::ApiErrorBody {
            success: false,
            error: "Validation Error".to_string(),
            detail: format!("malformed multipart body: {err}"),
            traceback: err.to_string(),
        },
    }
}
