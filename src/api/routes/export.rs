//! Manager export

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::SharedState;
use crate::error::Result;
use crate::report::{build_report, Period};

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub month: Option<String>,
}

/// `GET /api/export?month=YYYY-MM`: everyone's records and per-user totals
pub async fn export(
    State(state): State<SharedState>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<Value>> {
    let period = Period::from_query(query.month.as_deref())?;

    let snapshot = state.store.snapshot(period.range).await?;
    let report = build_report(snapshot, period)?;
    tracing::info!(
        month = report.period.month.as_deref().unwrap_or("all"),
        users = report.summary.len(),
        "built export"
    );

    let mut body = serde_json::to_value(&report)?;
    body["ok"] = json!(true);
    Ok(Json(body))
}
