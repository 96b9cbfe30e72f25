//! Output types: what the generation pipeline produces.
//!
//! Results are created once per request and never mutated afterwards.
//! Page lists are ordered by `page_number` starting at 1 with no gaps —
//! the orchestrator builds them in order, so this holds by construction
//! and is asserted in tests.

use serde::{Deserialize, Serialize};

/// Invitation wording produced by the text model.
///
/// The schema mirrors the prompt contract: three interchangeable variants
/// for the greeting, invitation, and closing sections; a single location
/// blurb. The UI picks one variant per section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeddingTexts {
    pub greetings: Vec<String>,
    pub invitations: Vec<String>,
    pub location: String,
    #[serde(alias = "closings")]
    pub closing: Vec<String>,
}

impl WeddingTexts {
    /// First greeting variant, used when a page prompt needs exactly one.
    pub fn primary_greeting(&self) -> &str {
        self.greetings.first().map(String::as_str).unwrap_or("")
    }

    /// First invitation variant.
    pub fn primary_invitation(&self) -> &str {
        self.invitations.first().map(String::as_str).unwrap_or("")
    }

    /// First closing variant.
    pub fn primary_closing(&self) -> &str {
        self.closing.first().map(String::as_str).unwrap_or("")
    }

    /// True when every section carries at least one non-blank entry.
    pub fn is_complete(&self) -> bool {
        let non_blank = |v: &[String]| v.iter().any(|s| !s.trim().is_empty());
        non_blank(&self.greetings)
            && non_blank(&self.invitations)
            && !self.location.trim().is_empty()
            && non_blank(&self.closing)
    }
}

/// Semantic role of one invitation page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Cover,
    Greeting,
    Invitation,
    Location,
    Closing,
    /// Combined greeting + invitation page used by the three-page tuning plan.
    Content,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Cover => "cover",
            PageKind::Greeting => "greeting",
            PageKind::Invitation => "invitation",
            PageKind::Location => "location",
            PageKind::Closing => "closing",
            PageKind::Content => "content",
        }
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated invitation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationPage {
    /// 1-based position in the invitation.
    pub page_number: usize,
    /// Public URL of the stored image.
    pub image_url: String,
    #[serde(rename = "type")]
    pub kind: PageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Timing and retry counters for one generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    pub total_duration_ms: u64,
    pub text_duration_ms: u64,
    pub image_duration_ms: u64,
    pub pages_generated: usize,
}

/// The full result of one invitation generation.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationResult {
    pub pages: Vec<InvitationPage>,
    pub texts: WeddingTexts,
    pub model_used: String,
    #[serde(skip_serializing_if = "stats_is_empty")]
    pub stats: GenerationStats,
}

fn stats_is_empty(s: &GenerationStats) -> bool {
    s.total_duration_ms == 0 && s.pages_generated == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_kind_serialises_lowercase() {
        let json = serde_json::to_string(&PageKind::Cover).unwrap();
        assert_eq!(json, "\"cover\"");
        let back: PageKind = serde_json::from_str("\"location\"").unwrap();
        assert_eq!(back, PageKind::Location);
    }

    #[test]
    fn page_serialises_kind_under_type_key() {
        let page = InvitationPage {
            page_number: 1,
            image_url: "http://localhost:8000/static/generated/x.png".into(),
            kind: PageKind::Cover,
            description: None,
        };
        let v = serde_json::to_value(&page).unwrap();
        assert_eq!(v["type"], "cover");
        assert_eq!(v["page_number"], 1);
        assert!(v.get("description").is_none());
    }

    #[test]
    fn completeness_requires_every_section() {
        let mut texts = WeddingTexts {
            greetings: vec!["안녕하세요".into()],
            invitations: vec!["초대합니다".into()],
            location: "더 클래식 500".into(),
            closing: vec!["감사합니다".into()],
        };
        assert!(texts.is_complete());
        texts.location = "   ".into();
        assert!(!texts.is_complete());
    }

    #[test]
    fn primary_accessors_fall_back_to_empty() {
        let texts = WeddingTexts::default();
        assert_eq!(texts.primary_greeting(), "");
        assert_eq!(texts.primary_closing(), "");
    }
}
