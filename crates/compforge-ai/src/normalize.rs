//! Extraction of `{jsxCode, cssCode}` from raw model output.
//!
//! Models are asked for a JSON object but frequently answer with bare source.
//! Normalization never fails: anything that does not parse to a `jsxCode`
//! string falls back to the verbatim text.

use tracing::debug;

use crate::content::GenerationResult;

/// Normalizes raw upstream text into a [`GenerationResult`].
///
/// - JSON object with a string `jsxCode`: returned with `cssCode` (or `""`).
/// - JSON without `jsxCode`, or not JSON at all: `{jsxCode: raw, cssCode: ""}`.
///
/// Text wrapped in a Markdown code fence is not JSON and comes back verbatim.
pub fn normalize(raw: &str) -> GenerationResult {
    if let Some(result) = parse_structured(raw) {
        return result;
    }
    debug!(len = raw.len(), "model output is not structured; using raw text as jsxCode");
    GenerationResult {
        jsx_code: raw.to_string(),
        css_code: String::new(),
    }
}

fn parse_structured(text: &str) -> Option<GenerationResult> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let jsx_code = value.get("jsxCode").and_then(|v| v.as_str())?;
    let css_code = value
        .get("cssCode")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    Some(GenerationResult {
        jsx_code: jsx_code.to_string(),
        css_code: css_code.to_string(),
    })
}
