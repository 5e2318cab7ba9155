use super::ollama::LlmClient;
use super::parser::{parse_recommendation_response, parse_timeline_response, parse_triage_response};
use super::prompt::{
    build_recommendation_prompt, build_timeline_prompt, build_triage_prompt,
    ADVISORY_SYSTEM_PROMPT,
};
use super::types::{
    AdvisoryOutcome, Recommendation, RecommendationInput, TimelineSummary, TimelineSummaryInput,
    TriageInput, TriageResult,
};
use super::AdvisoryError;

pub const TRIAGE_FAILED: &str =
    "Failed to get triage recommendation. The AI model may be unavailable.";
pub const RECOMMENDATION_FAILED: &str =
    "Failed to get recommendation. The AI model may be unavailable.";
pub const TIMELINE_SUMMARY_FAILED: &str =
    "Failed to get timeline summary. The AI model may be unavailable.";

/// Stateless advisory calls against one configured model.
pub struct AdvisoryService {
    client: Box<dyn LlmClient>,
    model: String,
}

impl AdvisoryService {
    pub fn new(client: Box<dyn LlmClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_model_available(&self) -> Result<bool, AdvisoryError> {
        self.client.is_model_available(&self.model)
    }

    pub fn triage(&self, input: &TriageInput) -> Result<TriageResult, AdvisoryError> {
        if input.patient_vitals.trim().is_empty() {
            return Err(AdvisoryError::InvalidInput("patientVitals is empty".into()));
        }
        let reply = self.generate(&build_triage_prompt(input))?;
        parse_triage_response(&reply)
    }

    pub fn recommend(&self, input: &RecommendationInput) -> Result<Recommendation, AdvisoryError> {
        let numbers = [
            input.heart_rate,
            input.temperature,
            input.oxygen_saturation,
            input.blood_pressure_systolic,
            input.blood_pressure_diastolic,
        ];
        if numbers.iter().any(|n| !n.is_finite()) {
            return Err(AdvisoryError::InvalidInput("vital values must be finite".into()));
        }
        let reply = self.generate(&build_recommendation_prompt(input))?;
        parse_recommendation_response(&reply)
    }

    pub fn summarize_timeline(
        &self,
        input: &TimelineSummaryInput,
    ) -> Result<TimelineSummary, AdvisoryError> {
        if input.vitals_data.trim().is_empty() {
            return Err(AdvisoryError::InvalidInput("vitalsData is empty".into()));
        }
        let reply = self.generate(&build_timeline_prompt(input))?;
        parse_timeline_response(&reply)
    }

    fn generate(&self, prompt: &str) -> Result<String, AdvisoryError> {
        let started = std::time::Instant::now();
        let reply = self
            .client
            .generate(&self.model, prompt, ADVISORY_SYSTEM_PROMPT);
        tracing::debug!(
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = reply.is_ok(),
            "Advisory generation finished"
        );
        reply
    }

    // ── Action boundary: model failures become `{"error": ...}` values ──
    //
    // Invalid input is still returned as `Err` so callers can reject the
    // request instead of reporting an outage.

    pub fn handle_triage(
        &self,
        input: &TriageInput,
    ) -> Result<AdvisoryOutcome<TriageResult>, AdvisoryError> {
        outcome(self.triage(input), "triage", TRIAGE_FAILED)
    }

    pub fn handle_recommendation(
        &self,
        input: &RecommendationInput,
    ) -> Result<AdvisoryOutcome<Recommendation>, AdvisoryError> {
        outcome(self.recommend(input), "recommendation", RECOMMENDATION_FAILED)
    }

    pub fn handle_timeline_summary(
        &self,
        input: &TimelineSummaryInput,
    ) -> Result<AdvisoryOutcome<TimelineSummary>, AdvisoryError> {
        outcome(
            self.summarize_timeline(input),
            "timeline_summary",
            TIMELINE_SUMMARY_FAILED,
        )
    }
}

fn outcome<T>(
    result: Result<T, AdvisoryError>,
    action: &str,
    message: &str,
) -> Result<AdvisoryOutcome<T>, AdvisoryError> {
    match result {
        Ok(value) => Ok(AdvisoryOutcome::Ready(value)),
        Err(e @ AdvisoryError::InvalidInput(_)) => {
            tracing::debug!(action, error = %e, "Advisory input rejected");
            Err(e)
        }
        Err(e) => {
            tracing::error!(action, error = %e, "Advisory call failed");
            Ok(AdvisoryOutcome::Failed {
                error: message.to_string(),
            })
        }
    }
}
