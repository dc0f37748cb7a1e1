//! Users and the records they own

pub mod validate;

use crate::auth::UserRole;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account as exposed through the API. Password data never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Account row including the credential, used only for login
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Fields needed to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Whether a write inserted a new row or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteAction {
    Created,
    Updated,
}

/// Serialize clock times as `HH:MM`
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(d)?;
        NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom)
    }
}

/// One day of work for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkHoursEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub work_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl WorkHoursEntry {
    /// Length of the shift in minutes. An end before the start is read as
    /// a shift running past midnight.
    pub fn minutes(&self) -> i64 {
        let diff = (self.end_time - self.start_time).num_minutes();
        if diff < 0 {
            diff + 24 * 60
        } else {
            diff
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VacationType {
    Vacation,
    Sick,
    ChildSick,
    Reserve,
}

impl VacationType {
    pub const ALL: [VacationType; 4] = [
        VacationType::Vacation,
        VacationType::Sick,
        VacationType::ChildSick,
        VacationType::Reserve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VacationType::Vacation => "vacation",
            VacationType::Sick => "sick",
            VacationType::ChildSick => "child_sick",
            VacationType::Reserve => "reserve",
        }
    }
}

impl fmt::Display for VacationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VacationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VacationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown vacation type '{}'", s))
    }
}

/// A day off for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacationEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vacation_date: NaiveDate,
    #[serde(rename = "type")]
    pub vacation_type: VacationType,
    pub created_at: DateTime<Utc>,
}

/// Outcome of inserting a vacation without overwriting
#[derive(Debug, Clone)]
pub enum VacationInsert {
    Created(VacationEntry),
    /// A vacation already occupies the (owner, date); nothing was written
    Exists(VacationEntry),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expense_date: NaiveDate,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Inclusive span of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// A record together with its owner's username, for manager listings.
/// `username` is `None` if the owner no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct WithUsername<T> {
    #[serde(flatten)]
    pub entry: T,
    pub username: Option<String>,
}
