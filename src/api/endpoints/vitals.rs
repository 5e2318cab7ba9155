//! Vital sign history endpoints.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CallerContext};
use crate::models::Vital;

/// `?start=&end=` as RFC 3339 timestamps. A missing bound is open.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl RangeQuery {
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (
            self.start.unwrap_or(DateTime::<Utc>::MIN_UTC),
            self.end.unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct VitalsResponse {
    pub vitals: Vec<Vital>,
}

#[derive(Debug, Deserialize)]
pub struct RecordVitalsRequest {
    pub vitals: Vec<Vital>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVitalsResponse {
    pub recorded: usize,
    pub total: usize,
}

/// `GET /api/profiles/:id/vitals?start&end`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<VitalsResponse>, ApiError> {
    let (start, end) = range.bounds();
    let vitals = ctx
        .core
        .directory()
        .vitals_in_range(&caller.caller, &id, start, end)?;
    Ok(Json(VitalsResponse { vitals }))
}

/// `POST /api/profiles/:id/vitals`
pub async fn record(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    Json(req): Json<RecordVitalsRequest>,
) -> Result<Json<RecordVitalsResponse>, ApiError> {
    let recorded = req.vitals.len();
    let total = ctx
        .core
        .directory()
        .record_vitals(&caller.caller, &id, req.vitals)?;
    Ok(Json(RecordVitalsResponse { recorded, total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bounds_are_open() {
        let (start, end) = RangeQuery::default().bounds();
        assert_eq!(start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(end, DateTime::<Utc>::MAX_UTC);
    }
}
