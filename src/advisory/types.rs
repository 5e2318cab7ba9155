use serde::{Deserialize, Serialize};

use crate::models::{TriagePriority, Urgency, Vital};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageInput {
    /// JSON text of the reading(s) to triage.
    pub patient_vitals: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_notes: Option<String>,
}

impl TriageInput {
    /// Triage input for a single stored reading.
    pub fn for_reading(reading: &Vital) -> Result<Self, serde_json::Error> {
        Ok(Self {
            patient_vitals: serde_json::to_string(reading)?,
            patient_history: None,
            patient_notes: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub recommendation: String,
    pub priority: TriagePriority,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationInput {
    pub heart_rate: f64,
    pub temperature: f64,
    pub oxygen_saturation: f64,
    pub blood_pressure_systolic: f64,
    pub blood_pressure_diastolic: f64,
    pub ecg_reading: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSummaryInput {
    /// JSON text of the readings in the window.
    pub vitals_data: String,
    pub start_time: String,
    pub end_time: String,
}

impl TimelineSummaryInput {
    /// Summary input spanning the first to the last of `readings`.
    pub fn from_readings(readings: &[Vital]) -> Result<Option<Self>, serde_json::Error> {
        let (Some(first), Some(last)) = (readings.first(), readings.last()) else {
            return Ok(None);
        };
        Ok(Some(Self {
            vitals_data: serde_json::to_string(readings)?,
            start_time: first.time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            end_time: last.time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub summary: String,
}

/// What an advisory action hands back to the presentation layer: the
/// result, or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdvisoryOutcome<T> {
    Ready(T),
    Failed { error: String },
}

impl<T> AdvisoryOutcome<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, AdvisoryOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BloodPressure;
    use chrono::{TimeZone, Utc};

    fn reading(hour: u32) -> Vital {
        Vital {
            time: Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap(),
            heart_rate: 71.0,
            temperature: 36.6,
            oxygen_saturation: 98.0,
            blood_pressure: BloodPressure {
                systolic: 117.0,
                diastolic: 76.0,
            },
        }
    }

    #[test]
    fn failed_outcome_serializes_as_error_object() {
        let outcome: AdvisoryOutcome<TimelineSummary> = AdvisoryOutcome::Failed {
            error: "boom".into(),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({ "error": "boom" })
        );
    }

    #[test]
    fn ready_outcome_serializes_transparently() {
        let outcome = AdvisoryOutcome::Ready(TimelineSummary {
            summary: "Stable".into(),
        });
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({ "summary": "Stable" })
        );
    }

    #[test]
    fn reading_is_encoded_for_triage() {
        let input = TriageInput::for_reading(&reading(2)).unwrap();
        assert!(input.patient_vitals.contains("2026-03-01T02:00:00Z"));
        assert!(input.patient_history.is_none());
    }

    #[test]
    fn summary_window_spans_first_to_last() {
        let input = TimelineSummaryInput::from_readings(&[reading(3), reading(9)])
            .unwrap()
            .unwrap();
        assert_eq!(input.start_time, "2026-03-01T03:00:00.000Z");
        assert_eq!(input.end_time, "2026-03-01T09:00:00.000Z");
        assert!(TimelineSummaryInput::from_readings(&[]).unwrap().is_none());
    }

    #[test]
    fn recommendation_input_uses_camel_case() {
        let json = serde_json::json!({
            "heartRate": 120.0, "temperature": 39.1, "oxygenSaturation": 91.0,
            "bloodPressureSystolic": 150.0, "bloodPressureDiastolic": 95.0,
            "ecgReading": "sinus tachycardia"
        });
        let input: RecommendationInput = serde_json::from_value(json).unwrap();
        assert_eq!(input.ecg_reading, "sinus tachycardia");
    }
}
