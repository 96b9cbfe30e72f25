//! Prompt templates for text and invitation-image generation.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing page wording or the style
//!    continuity rules means editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect assembled prompts without
//!    calling a real model, so prompt regressions are caught offline.
//!
//! The tuning endpoint can override individual page prompts at request
//! time; the templates here are used when no override is provided.

use crate::output::{PageKind, WeddingTexts};
use crate::request::{InvitationRequest, TextRequest};

/// System role for invitation text generation.
pub const TEXT_SYSTEM_PROMPT: &str = r#"You are a professional Korean wedding invitation copywriter.
You write warm, natural Korean suited to printed invitations.
Honorifics must be consistent, and parents' names appear only when provided.
Respond with JSON only — no prose, no code fences."#;

/// Task template for invitation text generation.
///
/// The response contract (3 greetings, 3 invitations, 1 location blurb,
/// 3 closings) matches [`WeddingTexts`].
pub fn text_generation_prompt(req: &TextRequest) -> String {
    format!(
        r#"{system}

---

Write Korean wedding invitation copy with this information:
- Tone: {tone}
- Groom: {groom_name} (father: {groom_father}, mother: {groom_mother})
- Bride: {bride_name} (father: {bride_father}, mother: {bride_mother})
- Venue: {venue}
- Address: {address}
- Date: {wedding_date}
- Time: {wedding_time}

Produce:
1. "greetings": 3 greeting variants, 2-3 sentences each (100-150 characters)
2. "invitations": 3 invitation variants, 2 sentences each (80-120 characters)
3. "location": 1 location guide, 1-2 sentences (50-80 characters)
4. "closing": 3 closing variants, 1-2 sentences each

Return exactly this JSON shape:
{{
  "greetings": ["...", "...", "..."],
  "invitations": ["...", "...", "..."],
  "location": "...",
  "closing": ["...", "...", "..."]
}}"#,
        system = TEXT_SYSTEM_PROMPT,
        tone = req.tone,
        groom_name = req.groom_name,
        groom_father = req.groom_father,
        groom_mother = req.groom_mother,
        bride_name = req.bride_name,
        bride_father = req.bride_father,
        bride_mother = req.bride_mother,
        venue = req.venue,
        address = req.address,
        wedding_date = req.wedding_date,
        wedding_time = req.wedding_time,
    )
}

/// Appended to every page call after the first.
///
/// The previous page's image is attached to the request; this suffix tells
/// the model what must not change. Continuity is enforced by re-supplying
/// the prior output, never by shared state.
pub const STYLE_CONTINUITY_SUFFIX: &str = r#"
The first attached image is the previous page of this invitation.
Reproduce its background texture, border style, colour palette, and font
treatment exactly — only the content of this page may differ."#;

/// One planned page: what to ask the model for and which references to attach.
#[derive(Debug, Clone)]
pub struct PagePlan {
    pub kind: PageKind,
    pub description: &'static str,
    pub prompt: String,
    /// Attach the couple's wedding photo (cover page only).
    pub wants_wedding_photo: bool,
    /// Attach the venue map image when one was fetched.
    pub wants_map: bool,
}

/// The full five-page plan: cover → greeting → invitation → location → closing.
pub fn full_page_plan(req: &InvitationRequest, texts: &WeddingTexts) -> Vec<PagePlan> {
    let border = req.border_design_id.as_deref().unwrap_or("classic_gold");
    vec![
        PagePlan {
            kind: PageKind::Cover,
            description: "웨딩 사진 커버",
            prompt: format!(
                "Wedding invitation cover card featuring the attached couple photo. \
                 Names: {} & {}. Border design: {border}. Tone: {}. \
                 Follow the attached style reference. Professional design, 3:4 aspect ratio.",
                req.text.groom_name, req.text.bride_name, req.text.tone,
            ),
            wants_wedding_photo: true,
            wants_map: false,
        },
        PagePlan {
            kind: PageKind::Greeting,
            description: "인사말",
            prompt: format!(
                "Wedding invitation greeting page. Text in Korean: {}. \
                 Elegant layout, generous whitespace.",
                texts.primary_greeting(),
            ),
            wants_wedding_photo: false,
            wants_map: false,
        },
        PagePlan {
            kind: PageKind::Invitation,
            description: "초대 문구",
            prompt: format!(
                "Wedding invitation main text page. Text in Korean: {}. \
                 Minimalist style.",
                texts.primary_invitation(),
            ),
            wants_wedding_photo: false,
            wants_map: false,
        },
        PagePlan {
            kind: PageKind::Location,
            description: "장소 안내",
            prompt: format!(
                "Wedding invitation venue information page. Venue: {} {}. \
                 Address: {}. Date: {} {}. Text in Korean: {}.",
                req.text.venue,
                req.floor_hall,
                req.text.address,
                req.text.wedding_date,
                req.text.wedding_time,
                texts.location,
            ),
            wants_wedding_photo: false,
            wants_map: true,
        },
        PagePlan {
            kind: PageKind::Closing,
            description: "마무리 인사",
            prompt: format!(
                "Wedding invitation closing card. Text in Korean: {}. Warm feeling.",
                texts.primary_closing(),
            ),
            wants_wedding_photo: false,
            wants_map: false,
        },
    ]
}

/// The reduced three-page tuning plan: cover → content → location.
///
/// `overrides[i]`, when present, replaces the built-in prompt for page i+1
/// verbatim (the continuity suffix is still appended by the pipeline).
pub fn tuning_page_plan(
    req: &InvitationRequest,
    texts: &WeddingTexts,
    overrides: &[Option<String>; 3],
) -> Vec<PagePlan> {
    let mut plan = vec![
        PagePlan {
            kind: PageKind::Cover,
            description: "웨딩 사진 커버",
            prompt: format!(
                "Wedding invitation cover card featuring the attached couple photo. \
                 Names: {} & {}. Tone: {}. Follow the attached style reference.",
                req.text.groom_name, req.text.bride_name, req.text.tone,
            ),
            wants_wedding_photo: true,
            wants_map: false,
        },
        PagePlan {
            kind: PageKind::Content,
            description: "인사말 & 초대",
            prompt: format!(
                "Wedding invitation content page. Greeting in Korean: {}. \
                 Invitation in Korean: {}.",
                texts.primary_greeting(),
                texts.primary_invitation(),
            ),
            wants_wedding_photo: false,
            wants_map: false,
        },
        PagePlan {
            kind: PageKind::Location,
            description: "장소 안내",
            prompt: format!(
                "Wedding invitation venue page. Venue: {}. Address: {}. \
                 Date: {} {}.",
                req.text.venue, req.text.address, req.text.wedding_date, req.text.wedding_time,
            ),
            wants_wedding_photo: false,
            wants_map: true,
        },
    ];

    for (page, slot) in plan.iter_mut().zip(overrides.iter()) {
        if let Some(text) = slot {
            if !text.trim().is_empty() {
                page.prompt = text.clone();
            }
        }
    }

    plan
}
