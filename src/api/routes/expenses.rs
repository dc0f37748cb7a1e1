//! Expense routes

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::IdRequest;
use crate::api::extract::ApiJson;
use crate::api::SharedState;
use crate::auth::CurrentUser;
use crate::error::{Error, Result};
use crate::records::validate::{
    parse_amount, parse_date, parse_description, present, require_fields,
};

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseRequest {
    #[serde(alias = "date")]
    pub expense_date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Value>,
}

/// `GET /api/expenses`
pub async fn list_own(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<Value>> {
    let rows = state.store.list_expenses(user.id()).await?;
    Ok(Json(json!({ "ok": true, "expenses": rows })))
}

/// `POST /api/expenses`
pub async fn create_own(
    State(state): State<SharedState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ExpenseRequest>,
) -> Result<Json<Value>> {
    require_fields(&[
        ("expense_date (or date)", present(&req.expense_date)),
        ("description", present(&req.description)),
        ("amount", req.amount.as_ref().is_some_and(|a| !a.is_null())),
    ])?;
    let date = parse_date("expense_date", req.expense_date.as_deref().unwrap_or_default())?;
    let description = parse_description(req.description.as_deref().unwrap_or_default())?;
    let amount = parse_amount(req.amount.as_ref().unwrap_or(&Value::Null))?;

    let entry = state
        .store
        .insert_expense(user.id(), date, &description, amount)
        .await?;

    Ok(Json(json!({ "ok": true, "expense": entry })))
}

/// `DELETE /api/expenses`: remove one of the caller's expenses by id
pub async fn delete_own(
    State(state): State<SharedState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<IdRequest>,
) -> Result<Json<Value>> {
    let id = req.parse()?;

    if !state.store.delete_expense(user.id(), id).await? {
        return Err(Error::NotFound("Expense not found".to_string()));
    }
    Ok(Json(json!({ "ok": true, "deleted": id })))
}

/// `GET /api/expenses/all`
pub async fn list_all(State(state): State<SharedState>) -> Result<Json<Value>> {
    let rows = state.store.list_all_expenses().await?;
    Ok(Json(json!({ "ok": true, "expenses": rows })))
}
