//! Work hours routes

use axum::{extract::State, Json};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{resolve_target, IdRequest, TargetRequest};
use crate::api::extract::ApiJson;
use crate::api::SharedState;
use crate::auth::CurrentUser;
use crate::error::{Error, Result};
use crate::records::validate::{parse_date, parse_time, present, require_fields};

#[derive(Debug, Default, Deserialize)]
pub struct WorkHoursRequest {
    #[serde(alias = "date")]
    pub work_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl WorkHoursRequest {
    fn validate(&self) -> Result<(NaiveDate, NaiveTime, NaiveTime)> {
        require_fields(&[
            ("work_date (or date)", present(&self.work_date)),
            ("start_time", present(&self.start_time)),
            ("end_time", present(&self.end_time)),
        ])?;

        let date = parse_date("work_date", self.work_date.as_deref().unwrap_or_default())?;
        let start = parse_time("start_time", self.start_time.as_deref().unwrap_or_default());
        let end = parse_time("end_time", self.end_time.as_deref().unwrap_or_default());
        match (start, end) {
            (Ok(start), Ok(end)) => Ok((date, start, end)),
            _ => Err(Error::Validation(
                "start_time and end_time must be HH:MM".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ManagerWorkHoursRequest {
    #[serde(flatten)]
    pub hours: WorkHoursRequest,
    #[serde(flatten)]
    pub target: TargetRequest,
}

/// `GET /api/work-hours`
pub async fn list_own(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<Value>> {
    let rows = state.store.list_work_hours(user.id()).await?;
    Ok(Json(json!({ "ok": true, "workHours": rows })))
}

/// `POST /api/work-hours`: create or replace the caller's hours for a day
pub async fn upsert_own(
    State(state): State<SharedState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<WorkHoursRequest>,
) -> Result<Json<Value>> {
    let (date, start, end) = req.validate()?;

    let (entry, action) = state
        .store
        .upsert_work_hours(user.id(), date, start, end)
        .await?;

    Ok(Json(json!({ "ok": true, "workHours": entry, "action": action })))
}

/// `DELETE /api/work-hours`: remove one of the caller's entries by id
pub async fn delete_own(
    State(state): State<SharedState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<IdRequest>,
) -> Result<Json<Value>> {
    let id = req.parse()?;

    if !state.store.delete_work_hours(user.id(), id).await? {
        return Err(Error::NotFound("Work hours entry not found".to_string()));
    }
    Ok(Json(json!({ "ok": true, "deleted": id })))
}

/// `POST /api/work-hours/manager`: create or replace hours for any user
pub async fn upsert_for_user(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<ManagerWorkHoursRequest>,
) -> Result<Json<Value>> {
    let (date, start, end) = req.hours.validate()?;
    let key = req.target.key()?;

    let target = resolve_target(state.store.as_ref(), key).await?;
    let (entry, action) = state
        .store
        .upsert_work_hours(target.id, date, start, end)
        .await?;

    Ok(Json(json!({
        "ok": true,
        "workHours": entry,
        "action": action,
        "username": target.username,
    })))
}

/// `GET /api/work-hours/all`
pub async fn list_all(State(state): State<SharedState>) -> Result<Json<Value>> {
    let rows = state.store.list_all_work_hours().await?;
    Ok(Json(json!({ "ok": true, "workHours": rows })))
}
