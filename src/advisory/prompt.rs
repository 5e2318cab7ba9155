use super::types::{RecommendationInput, TimelineSummaryInput, TriageInput};

/// Shared system prompt: every advisory reply must be a bare JSON object.
pub const ADVISORY_SYSTEM_PROMPT: &str = "You are a medical AI assistant embedded in a patient \
monitoring system. You never claim to replace a clinician. Reply with a single JSON object \
and nothing else.";

pub fn build_triage_prompt(input: &TriageInput) -> String {
    let history = input.patient_history.as_deref().unwrap_or("");
    let notes = input.patient_notes.as_deref().unwrap_or("");
    format!(
        r#"You are Zizo_MediAI, an AI triage assistant for doctors.

You are provided with patient vitals, medical history, and notes. Your task is to analyze this information and provide a recommendation, priority, and explanation.

Patient Vitals: {vitals}
Patient History: {history}
Patient Notes: {notes}

Based on this information, provide a recommendation, assign a priority (High, Medium, or Low), and explain your reasoning.

Ensure that the recommendation is clear and actionable. The priority should reflect the urgency of the situation.

Format your output as a JSON object with the following fields:
- recommendation: An AI-driven recommendation for the patient.
- priority: The priority of the case (High, Medium, or Low).
- explanation: A brief explanation of why the recommendation was made and the priority assigned.
"#,
        vitals = input.patient_vitals,
    )
}

pub fn build_recommendation_prompt(input: &RecommendationInput) -> String {
    format!(
        r#"You are an AI health assistant that provides recommendations to patients based on their vital signs.

Given the following vital signs, generate a recommendation for the patient. Include an assessment of the urgency of the recommendation (low, medium, or high).

Heart Rate: {hr} BPM
Temperature: {temp} °C
Oxygen Saturation: {spo2}%
Blood Pressure: {sys}/{dia} mmHg
ECG Reading: {ecg}

Consider the following when generating the recommendation:
- Normal ranges for vital signs
- Potential causes of abnormal vital signs
- Appropriate actions for the patient to take

Format the recommendation to be concise and easy to understand. If the vitals are within normal limits, recommend that the patient continue to monitor their health.

Output a JSON object: {{"recommendation": "...", "urgency": "low" | "medium" | "high"}}
"#,
        hr = input.heart_rate,
        temp = input.temperature,
        spo2 = input.oxygen_saturation,
        sys = input.blood_pressure_systolic,
        dia = input.blood_pressure_diastolic,
        ecg = input.ecg_reading,
    )
}

pub fn build_timeline_prompt(input: &TimelineSummaryInput) -> String {
    format!(
        r#"You are a medical AI assistant tasked with summarizing changes in a patient's vital signs over a specific period.

You will receive vital signs data, a start time, and an end time. Analyze the data to identify significant changes and provide a summary of what changed and possible reasons for those changes. Consider potential correlations between different vital signs.

Vitals Data: {data}
Start Time: {start}
End Time: {end}

Output a JSON object: {{"summary": "..."}}
"#,
        data = input.vitals_data,
        start = input.start_time,
        end = input.end_time,
    )
}
