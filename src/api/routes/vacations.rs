//! Vacation routes
//!
//! Employees may not overwrite an existing day off; managers may.

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{resolve_target, TargetRequest};
use crate::api::extract::ApiJson;
use crate::api::SharedState;
use crate::auth::CurrentUser;
use crate::error::{Error, Result};
use crate::records::validate::{parse_date, parse_vacation_type, present, require_fields};
use crate::records::{VacationInsert, VacationType, WriteAction};

#[derive(Debug, Default, Deserialize)]
pub struct VacationRequest {
    #[serde(alias = "vac_date", alias = "date")]
    pub vacation_date: Option<String>,
    #[serde(rename = "type")]
    pub vacation_type: Option<String>,
}

impl VacationRequest {
    fn validate(&self) -> Result<(NaiveDate, VacationType)> {
        require_fields(&[
            ("date (vacation_date/vac_date)", present(&self.vacation_date)),
            ("type", present(&self.vacation_type)),
        ])?;
        Ok((
            parse_date("date", self.vacation_date.as_deref().unwrap_or_default())?,
            parse_vacation_type(self.vacation_type.as_deref().unwrap_or_default())?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VacationDateRequest {
    #[serde(alias = "vac_date", alias = "date")]
    pub vacation_date: Option<String>,
}

impl VacationDateRequest {
    fn validate(&self) -> Result<NaiveDate> {
        require_fields(&[("date (vacation_date/vac_date)", present(&self.vacation_date))])?;
        parse_date("date", self.vacation_date.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ManagerVacationRequest {
    #[serde(flatten)]
    pub vacation: VacationRequest,
    #[serde(flatten)]
    pub target: TargetRequest,
}

#[derive(Debug, Default, Deserialize)]
pub struct ManagerVacationDateRequest {
    #[serde(flatten)]
    pub vacation: VacationDateRequest,
    #[serde(flatten)]
    pub target: TargetRequest,
}

/// `GET /api/vacations`
pub async fn list_own(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<Value>> {
    let rows = state.store.list_vacations(user.id()).await?;
    Ok(Json(json!({ "ok": true, "vacations": rows })))
}

/// `POST /api/vacations`: 409 with the existing record if the day is taken
pub async fn create_own(
    State(state): State<SharedState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<VacationRequest>,
) -> Result<Json<Value>> {
    let (date, vacation_type) = req.validate()?;

    match state
        .store
        .insert_vacation(user.id(), date, vacation_type)
        .await?
    {
        VacationInsert::Created(entry) => Ok(Json(json!({
            "ok": true,
            "vacation": entry,
            "action": WriteAction::Created,
        }))),
        VacationInsert::Exists(existing) => Err(Error::conflict(
            "Vacation already exists for this date",
            existing,
        )),
    }
}

/// `DELETE /api/vacations`: succeeds whether or not a row matched
pub async fn delete_own(
    State(state): State<SharedState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<VacationDateRequest>,
) -> Result<Json<Value>> {
    let date = req.validate()?;
    let deleted = state.store.delete_vacation(user.id(), date).await?;
    Ok(Json(json!({ "ok": true, "deleted": deleted })))
}

/// `POST /api/vacations/manager`: set a user's day off, replacing the type if one exists
pub async fn set_for_user(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<ManagerVacationRequest>,
) -> Result<Json<Value>> {
    let (date, vacation_type) = req.vacation.validate()?;
    let key = req.target.key()?;

    let target = resolve_target(state.store.as_ref(), key).await?;
    let (entry, action) = state
        .store
        .upsert_vacation(target.id, date, vacation_type)
        .await?;

    Ok(Json(json!({
        "ok": true,
        "vacation": entry,
        "action": action,
        "username": target.username,
    })))
}

/// `DELETE /api/vacations/manager`
pub async fn delete_for_user(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<ManagerVacationDateRequest>,
) -> Result<Json<Value>> {
    let date = req.vacation.validate()?;
    let key = req.target.key()?;

    let target = resolve_target(state.store.as_ref(), key).await?;
    let deleted = state.store.delete_vacation(target.id, date).await?;
    Ok(Json(json!({ "ok": true, "deleted": deleted })))
}

/// `GET /api/vacations/all`
pub async fn list_all(State(state): State<SharedState>) -> Result<Json<Value>> {
    let rows = state.store.list_all_vacations().await?;
    Ok(Json(json!({ "ok": true, "vacations": rows })))
}
