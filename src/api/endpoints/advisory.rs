//! AI advisory endpoints.
//!
//! Model calls block on HTTP, so they run on the blocking pool. A failed
//! model call is still a 200 carrying `{"error": "..."}`; only bad input
//! or access failures become `ApiError`s.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use crate::advisory::{
    AdvisoryOutcome, Recommendation, RecommendationInput, TimelineSummary, TimelineSummaryInput,
    TriageInput, TriageResult,
};
use crate::api::endpoints::vitals::RangeQuery;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::profiles::DataError;

/// `POST /api/advisory/triage`
pub async fn triage(
    State(ctx): State<ApiContext>,
    Json(input): Json<TriageInput>,
) -> Result<Json<AdvisoryOutcome<TriageResult>>, ApiError> {
    let advisory = ctx.core.advisory();
    let outcome = tokio::task::spawn_blocking(move || advisory.handle_triage(&input)).await??;
    Ok(Json(outcome))
}

/// `POST /api/advisory/recommendation`
pub async fn recommendation(
    State(ctx): State<ApiContext>,
    Json(input): Json<RecommendationInput>,
) -> Result<Json<AdvisoryOutcome<Recommendation>>, ApiError> {
    let advisory = ctx.core.advisory();
    let outcome =
        tokio::task::spawn_blocking(move || advisory.handle_recommendation(&input)).await??;
    Ok(Json(outcome))
}

/// `POST /api/advisory/timeline-summary`
pub async fn timeline_summary(
    State(ctx): State<ApiContext>,
    Json(input): Json<TimelineSummaryInput>,
) -> Result<Json<AdvisoryOutcome<TimelineSummary>>, ApiError> {
    let advisory = ctx.core.advisory();
    let outcome =
        tokio::task::spawn_blocking(move || advisory.handle_timeline_summary(&input)).await??;
    Ok(Json(outcome))
}

/// `POST /api/profiles/:id/triage-latest`, triage of the newest reading.
pub async fn triage_latest(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Result<Json<AdvisoryOutcome<TriageResult>>, ApiError> {
    let profile = ctx.core.directory().get_profile(&caller.caller, &id)?;
    let latest = profile
        .latest_vital()
        .ok_or_else(|| DataError::Validation(format!("Profile {id} has no recorded vitals")))?;
    let input = TriageInput::for_reading(latest)
        .map_err(|e| ApiError::Internal(format!("encode reading: {e}")))?;

    let advisory = ctx.core.advisory();
    let outcome = tokio::task::spawn_blocking(move || advisory.handle_triage(&input)).await??;
    Ok(Json(outcome))
}

/// `POST /api/profiles/:id/timeline-summary?start&end`
pub async fn profile_timeline_summary(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<AdvisoryOutcome<TimelineSummary>>, ApiError> {
    let (start, end) = range.bounds();
    let readings = ctx
        .core
        .directory()
        .vitals_in_range(&caller.caller, &id, start, end)?;
    let input = TimelineSummaryInput::from_readings(&readings)
        .map_err(|e| ApiError::Internal(format!("encode readings: {e}")))?
        .ok_or_else(|| DataError::Validation("No vitals in the requested range".into()))?;

    let advisory = ctx.core.advisory();
    let outcome =
        tokio::task::spawn_blocking(move || advisory.handle_timeline_summary(&input)).await??;
    Ok(Json(outcome))
}
