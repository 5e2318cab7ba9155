use serde::de::DeserializeOwned;

use super::types::{Recommendation, TimelineSummary, TriageResult};
use super::AdvisoryError;

/// Locate the first JSON object in a model reply.
///
/// Accepts a bare object, an object inside ``` fences, or an object with
/// prose around it. Braces inside string literals are respected.
pub fn extract_json_object(response: &str) -> Result<&str, AdvisoryError> {
    let start = response
        .find('{')
        .ok_or_else(|| AdvisoryError::Malformed("No JSON object found".into()))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in response[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&response[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    Err(AdvisoryError::Malformed("Unclosed JSON object".into()))
}

/// Extract and deserialize the reply into `T`. Enum fields must match
/// their closed sets exactly.
pub fn parse_response<T: DeserializeOwned>(response: &str) -> Result<T, AdvisoryError> {
    let json = extract_json_object(response)?;
    serde_json::from_str(json).map_err(|e| AdvisoryError::Malformed(e.to_string()))
}

fn require_text(field: &str, value: &str) -> Result<(), AdvisoryError> {
    if value.trim().is_empty() {
        return Err(AdvisoryError::Malformed(format!("Empty {field}")));
    }
    Ok(())
}

pub fn parse_triage_response(response: &str) -> Result<TriageResult, AdvisoryError> {
    let result: TriageResult = parse_response(response)?;
    require_text("recommendation", &result.recommendation)?;
    require_text("explanation", &result.explanation)?;
    Ok(result)
}

pub fn parse_recommendation_response(response: &str) -> Result<Recommendation, AdvisoryError> {
    let result: Recommendation = parse_response(response)?;
    require_text("recommendation", &result.recommendation)?;
    Ok(result)
}

pub fn parse_timeline_response(response: &str) -> Result<TimelineSummary, AdvisoryError> {
    let result: TimelineSummary = parse_response(response)?;
    require_text("summary", &result.summary)?;
    Ok(result)
}
