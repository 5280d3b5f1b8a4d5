//! Analysis request and result types, plus response normalization.
//!
//! The scoring backend's response shape has drifted across revisions: the
//! analysis fields are sometimes wrapped in an `analysis` object and sometimes
//! flattened, and `overall_summary` has appeared as plain `summary`. All of
//! that tolerance lives here; raw backend JSON never escapes this module.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder used when the backend omits the summary
pub const DEFAULT_SUMMARY: &str = "No summary available.";
/// Placeholder used when the backend omits the final recommendation
pub const DEFAULT_RECOMMENDATION: &str = "No recommendation available.";
/// Summary shown on the synthesized fallback result
pub const FALLBACK_SUMMARY: &str = "We could not complete a full analysis of your resume right \
now. Your submission was received, but the scoring service did not return a usable report. \
Please try again in a few minutes.";

/// A single submission to the scoring backend.
///
/// Constructed once per submission by the form collector, which has already
/// validated the file and contact details; nothing here re-checks them.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Raw PDF bytes
    pub resume: Vec<u8>,
    /// Original file name, forwarded in the multipart part
    pub file_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_role: Option<String>,
}

/// The canonical analysis shape everything downstream depends on.
///
/// Every list defaults to empty and every string to a documented placeholder,
/// so no consumer ever has to branch on a missing field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub ats_score: i64,
    pub overall_summary: String,
    pub strengths: Vec<String>,
    pub missing_or_weak_areas: Vec<String>,
    pub ats_keyword_gaps: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub structure_feedback: Vec<String>,
    pub final_recommendation: String,
    pub is_fallback: bool,
    pub extracted_email: Option<String>,
}

impl AnalysisResult {
    /// Synthesize the degraded result substituted when the backend is
    /// unreachable or returns something unusable.
    ///
    /// `extracted_email` is set to the address the user typed so the email
    /// follow-up still has a target.
    pub fn fallback(user_email: Option<&str>) -> Self {
        Self {
            ats_score: 0,
            overall_summary: FALLBACK_SUMMARY.to_string(),
            strengths: Vec::new(),
            missing_or_weak_areas: Vec::new(),
            ats_keyword_gaps: Vec::new(),
            improvement_suggestions: Vec::new(),
            structure_feedback: Vec::new(),
            final_recommendation: DEFAULT_RECOMMENDATION.to_string(),
            is_fallback: true,
            extracted_email: user_email.map(str::to_string),
        }
    }
}

/// Normalize a raw backend payload into the canonical [`AnalysisResult`].
///
/// Returns `None` when the payload carries no recognizable analysis at all,
/// in which case the caller substitutes [`AnalysisResult::fallback`]. Partial
/// payloads always normalize: absent lists become empty, absent strings take
/// their placeholder, and a non-numeric score becomes 0.
pub fn normalize(raw: &Value) -> Option<AnalysisResult> {
    let payload = extract_payload(raw)?;

    Some(AnalysisResult {
        ats_score: read_score(payload),
        overall_summary: read_string(payload, "overall_summary", Some("summary"))
            .unwrap_or_else(|| DEFAULT_SUMMARY.to_string()),
        strengths: read_list(payload, "strengths"),
        missing_or_weak_areas: read_list(payload, "missing_or_weak_areas"),
        ats_keyword_gaps: read_list(payload, "ats_keyword_gaps"),
        improvement_suggestions: read_list(payload, "improvement_suggestions"),
        structure_feedback: read_list(payload, "structure_feedback"),
        final_recommendation: read_string(payload, "final_recommendation", None)
            .unwrap_or_else(|| DEFAULT_RECOMMENDATION.to_string()),
        is_fallback: payload
            .get("is_fallback")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        extracted_email: read_string(payload, "extracted_email", None),
    })
}

/// Keys whose presence marks an object as an analysis payload
const ANALYSIS_MARKERS: &[&str] = &[
    "ats_score",
    "overall_summary",
    "summary",
    "final_recommendation",
    "strengths",
];

/// Locate the analysis object inside the response.
///
/// Some backend revisions wrap it as `{ analysis: {...}, email_sent, message }`,
/// others flatten the fields to the top level.
fn extract_payload(raw: &Value) -> Option<&Value> {
    if let Some(nested) = raw.get("analysis") {
        if nested.is_object() {
            return Some(nested);
        }
    }

    let obj = raw.as_object()?;
    if ANALYSIS_MARKERS.iter().any(|key| obj.contains_key(*key)) {
        Some(raw)
    } else {
        None
    }
}

/// Coerce the score from an integer, float, or numeric string, clamped to 0–100
fn read_score(payload: &Value) -> i64 {
    let raw = match payload.get("ats_score") {
        Some(value) => value,
        None => return 0,
    };

    let score = if let Some(n) = raw.as_i64() {
        n
    } else if let Some(f) = raw.as_f64() {
        f.round() as i64
    } else if let Some(s) = raw.as_str() {
        s.trim().parse::<i64>().unwrap_or(0)
    } else {
        0
    };

    score.clamp(0, 100)
}

fn read_string(payload: &Value, key: &str, alternate: Option<&str>) -> Option<String> {
    let value = payload
        .get(key)
        .or_else(|| alternate.and_then(|alt| payload.get(alt)))?;
    let text = value.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn read_list(payload: &Value, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
