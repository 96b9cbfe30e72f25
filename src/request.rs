//! Request types: what a caller submits to the generation pipeline.
//!
//! Requests are plain owned structs, immutable once handed to the
//! pipeline. Validation happens up front — a request with missing
//! required fields is rejected before any external provider is called,
//! so a malformed submission never costs an API call.

use crate::error::WedcardError;

/// Input for stand-alone invitation text generation.
///
/// Parent names may be empty; everything else is required.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TextRequest {
    /// Writing tone: formal, casual, modern, classic, romantic, minimal.
    #[serde(default = "default_tone")]
    pub tone: String,
    pub groom_name: String,
    pub bride_name: String,
    #[serde(default)]
    pub groom_father: String,
    #[serde(default)]
    pub groom_mother: String,
    #[serde(default)]
    pub bride_father: String,
    #[serde(default)]
    pub bride_mother: String,
    pub venue: String,
    /// Ceremony date as the caller wants it printed, e.g. "2025년 4월 12일 토요일".
    pub wedding_date: String,
    /// Ceremony time as printed, e.g. "오후 2시 30분".
    pub wedding_time: String,
    #[serde(default)]
    pub address: String,
}

fn default_tone() -> String {
    "romantic".to_string()
}

impl TextRequest {
    /// Reject the request if any required field is absent or blank.
    pub fn validate(&self) -> Result<(), WedcardError> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("tone", &self.tone),
            ("groom_name", &self.groom_name),
            ("bride_name", &self.bride_name),
            ("venue", &self.venue),
            ("wedding_date", &self.wedding_date),
            ("wedding_time", &self.wedding_time),
        ] {
            if value.trim().is_empty() {
                missing.push(name.to_string());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WedcardError::MissingFields { fields: missing })
        }
    }
}

/// Input for full invitation generation: the text fields plus the two
/// reference photos and optional venue geo-coordinates.
#[derive(Debug, Clone, Default)]
pub struct InvitationRequest {
    pub text: TextRequest,
    /// The couple's wedding photo; identity reference for the cover page.
    pub wedding_image: Vec<u8>,
    /// Style reference photo; supplied to every page call so the visual
    /// theme stays constant across pages.
    pub style_image: Vec<u8>,
    /// Border/frame preset id, e.g. "classic_gold".
    pub border_design_id: Option<String>,
    /// Venue floor/hall note printed on the location page.
    pub floor_hall: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Image model override; the configured default is used when `None`.
    pub model_name: Option<String>,
}

impl InvitationRequest {
    /// Reject the request if any required field is absent.
    ///
    /// Runs before any external call: text fields, the wedding photo and
    /// the style photo are all mandatory for a full generation.
    pub fn validate(&self) -> Result<(), WedcardError> {
        let mut missing = match self.text.validate() {
            Ok(()) => Vec::new(),
            Err(WedcardError::MissingFields { fields }) => fields,
            Err(other) => return Err(other),
        };
        if self.text.address.trim().is_empty() {
            missing.push("address".to_string());
        }
        if self.wedding_image.is_empty() {
            missing.push("wedding_image".to_string());
        }
        if self.style_image.is_empty() {
            missing.push("style_image".to_string());
        }
        if missing.is_empty() {
            Ok(())
        } else {
            missing.sort();
            Err(WedcardError::MissingFields { fields: missing })
        }
    }

    /// Both coordinates present — the location page may carry a map.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

/// Input for the tuning endpoint: a reduced three-page run with optional
/// per-page prompt overrides, used to iterate on prompt wording without
/// burning a full five-page generation.
#[derive(Debug, Clone, Default)]
pub struct TuningRequest {
    pub base: InvitationRequest,
    /// Raw prompt replacing the built-in template for pages 1–3.
    pub prompt_overrides: [Option<String>; 3],
}
