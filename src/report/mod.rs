//! Aggregate export of everyone's records for a period

use crate::auth::UserRole;
use crate::error::{Error, Result};
use crate::records::{
    DateRange, ExpenseEntry, User, VacationEntry, VacationType, WorkHoursEntry,
};
use crate::store::Snapshot;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Username shown for records whose owner is not in the user list
pub const UNKNOWN_USERNAME: &str = "unknown";

/// Period an export covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    /// `YYYY-MM` when the export is for one month
    pub month: Option<String>,
    #[serde(flatten)]
    pub range: Option<DateRange>,
}

impl Period {
    pub fn all_time() -> Self {
        Self {
            month: None,
            range: None,
        }
    }

    /// Parse a `YYYY-MM` month into the range from its first to its last day
    pub fn parse_month(month: &str) -> Result<Self> {
        let invalid = || Error::Validation("month must be YYYY-MM".to_string());
        let month = month.trim();

        let (year, mon) = month.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || mon.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let mon: u32 = mon.parse().map_err(|_| invalid())?;

        let from = NaiveDate::from_ymd_opt(year, mon, 1).ok_or_else(invalid)?;
        let next = if mon == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, mon + 1, 1)
        }
        .ok_or_else(invalid)?;
        let to = next.pred_opt().ok_or_else(invalid)?;

        Ok(Self {
            month: Some(format!("{:04}-{:02}", from.year(), from.month())),
            range: Some(DateRange { from, to }),
        })
    }

    /// Parse the optional `month` query parameter; blank or absent means all time
    pub fn from_query(month: Option<&str>) -> Result<Self> {
        match month.map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => Self::parse_month(m),
            None => Ok(Self::all_time()),
        }
    }
}

/// Days off per vacation type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VacationDays {
    pub vacation: u32,
    pub sick: u32,
    pub child_sick: u32,
    pub reserve: u32,
}

impl VacationDays {
    fn add(&mut self, vacation_type: VacationType) {
        match vacation_type {
            VacationType::Vacation => self.vacation += 1,
            VacationType::Sick => self.sick += 1,
            VacationType::ChildSick => self.child_sick += 1,
            VacationType::Reserve => self.reserve += 1,
        }
    }
}

/// Per-user totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub user_id: Uuid,
    pub username: String,
    pub role: Option<UserRole>,
    pub total_minutes: i64,
    /// `H:MM` rendering of `total_minutes`
    pub total_hours: String,
    pub work_days: u32,
    pub vacation_days: VacationDays,
    #[serde(with = "rust_decimal::serde::float")]
    pub expense_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub period: Period,
    pub users: Vec<User>,
    pub work_hours: Vec<WorkHoursEntry>,
    pub vacations: Vec<VacationEntry>,
    pub expenses: Vec<ExpenseEntry>,
    pub summary: Vec<SummaryRow>,
}

#[derive(Default)]
struct Totals {
    minutes: i64,
    work_days: u32,
    vacation_days: VacationDays,
    expenses: Decimal,
}

pub fn format_minutes(minutes: i64) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

/// Group the snapshot's records by owner and emit one summary row per user.
///
/// Every user gets a row, with zero totals if they have no records in the
/// period. Owners that are not in the user list get a row too, labelled
/// [`UNKNOWN_USERNAME`], after the known users.
///
/// Fails with [`Error::Internal`] if a user's expense total does not fit in
/// a [`Decimal`].
pub fn build_report(snapshot: Snapshot, period: Period) -> Result<Report> {
    let range = period.range;
    let in_period = |date: NaiveDate| range.map_or(true, |r| r.contains(date));

    let Snapshot {
        users,
        work_hours,
        vacations,
        expenses,
    } = snapshot;

    let work_hours: Vec<_> = work_hours
        .into_iter()
        .filter(|w| in_period(w.work_date))
        .collect();
    let vacations: Vec<_> = vacations
        .into_iter()
        .filter(|v| in_period(v.vacation_date))
        .collect();
    let expenses: Vec<_> = expenses
        .into_iter()
        .filter(|e| in_period(e.expense_date))
        .collect();

    let mut totals: HashMap<Uuid, Totals> = HashMap::new();
    for entry in &work_hours {
        let t = totals.entry(entry.user_id).or_default();
        t.minutes += entry.minutes();
        t.work_days += 1;
    }
    for entry in &vacations {
        totals
            .entry(entry.user_id)
            .or_default()
            .vacation_days
            .add(entry.vacation_type);
    }
    for entry in &expenses {
        let t = totals.entry(entry.user_id).or_default();
        t.expenses = t.expenses.checked_add(entry.amount).ok_or_else(|| {
            Error::Internal(format!("expense total overflow for user {}", entry.user_id))
        })?;
    }

    let row = |user_id: Uuid, username: String, role: Option<UserRole>, t: Totals| SummaryRow {
        user_id,
        username,
        role,
        total_minutes: t.minutes,
        total_hours: format_minutes(t.minutes),
        work_days: t.work_days,
        vacation_days: t.vacation_days,
        expense_total: t.expenses,
    };

    let mut summary: Vec<SummaryRow> = users
        .iter()
        .map(|u| {
            let t = totals.remove(&u.id).unwrap_or_default();
            row(u.id, u.username.clone(), Some(u.role), t)
        })
        .collect();

    // Whatever is left belongs to owners missing from the user list
    let orphans: BTreeMap<Uuid, Totals> = totals.into_iter().collect();
    summary.extend(
        orphans
            .into_iter()
            .map(|(id, t)| row(id, UNKNOWN_USERNAME.to_string(), None, t)),
    );

    Ok(Report {
        period,
        users,
        work_hours,
        vacations,
        expenses,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::validate::MAX_AMOUNT;
    use chrono::{NaiveTime, Utc};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: name.to_string(),
            role: UserRole::Employee,
            created_at: Utc::now(),
        }
    }

    fn work(owner: Uuid, d: &str, start: &str, end: &str) -> WorkHoursEntry {
        WorkHoursEntry {
            id: Uuid::new_v4(),
            user_id: owner,
            work_date: date(d),
            start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            created_at: Utc::now(),
        }
    }

    fn vacation(owner: Uuid, d: &str, vacation_type: VacationType) -> VacationEntry {
        VacationEntry {
            id: Uuid::new_v4(),
            user_id: owner,
            vacation_date: date(d),
            vacation_type,
            created_at: Utc::now(),
        }
    }

    fn expense(owner: Uuid, d: &str, amount: Decimal) -> ExpenseEntry {
        ExpenseEntry {
            id: Uuid::new_v4(),
            user_id: owner,
            expense_date: date(d),
            description: "Taxi".to_string(),
            amount,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_month() {
        let period = Period::parse_month("2025-03").unwrap();
        assert_eq!(period.month.as_deref(), Some("2025-03"));
        assert_eq!(
            period.range,
            Some(DateRange {
                from: date("2025-03-01"),
                to: date("2025-03-31"),
            })
        );

        let feb = Period::parse_month("2024-02").unwrap().range.unwrap();
        assert_eq!(feb.to, date("2024-02-29"));

        let dec = Period::parse_month("2025-12").unwrap().range.unwrap();
        assert_eq!(dec.to, date("2025-12-31"));

        assert!(Period::parse_month("2025-13").is_err());
        assert!(Period::parse_month("2025-3").is_err());
        assert!(Period::parse_month("March").is_err());
    }

    #[test]
    fn test_from_query() {
        assert_eq!(Period::from_query(None).unwrap(), Period::all_time());
        assert_eq!(Period::from_query(Some("  ")).unwrap(), Period::all_time());
        assert!(Period::from_query(Some("2025-03")).unwrap().range.is_some());
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0:00");
        assert_eq!(format_minutes(485), "8:05");
        assert_eq!(format_minutes(2400), "40:00");
    }

    #[test]
    fn test_summary_totals() {
        let alice = user("alice");
        let bob = user("bob");
        let snapshot = Snapshot {
            users: vec![alice.clone(), bob.clone()],
            work_hours: vec![
                work(alice.id, "2025-03-10", "09:00", "17:00"),
                work(alice.id, "2025-03-11", "09:00", "12:30"),
            ],
            vacations: vec![
                vacation(alice.id, "2025-03-12", VacationType::Sick),
                vacation(alice.id, "2025-03-13", VacationType::Sick),
                vacation(alice.id, "2025-03-14", VacationType::Reserve),
            ],
            expenses: vec![
                expense(alice.id, "2025-03-10", Decimal::new(1050, 2)),
                expense(alice.id, "2025-03-11", Decimal::new(450, 2)),
            ],
        };

        let report = build_report(snapshot, Period::parse_month("2025-03").unwrap()).unwrap();
        assert_eq!(report.summary.len(), 2);

        let a = &report.summary[0];
        assert_eq!(a.username, "alice");
        assert_eq!(a.total_minutes, 8 * 60 + 3 * 60 + 30);
        assert_eq!(a.total_hours, "11:30");
        assert_eq!(a.work_days, 2);
        assert_eq!(a.vacation_days.sick, 2);
        assert_eq!(a.vacation_days.reserve, 1);
        assert_eq!(a.vacation_days.vacation, 0);
        assert_eq!(a.expense_total, Decimal::new(15, 0));

        let b = &report.summary[1];
        assert_eq!(b.username, "bob");
        assert_eq!(b.total_minutes, 0);
        assert_eq!(b.vacation_days, VacationDays::default());
        assert_eq!(b.expense_total, Decimal::ZERO);
    }

    #[test]
    fn test_records_outside_period_are_dropped() {
        let alice = user("alice");
        let snapshot = Snapshot {
            users: vec![alice.clone()],
            work_hours: vec![
                work(alice.id, "2025-02-28", "09:00", "17:00"),
                work(alice.id, "2025-03-31", "09:00", "10:00"),
                work(alice.id, "2025-04-01", "09:00", "17:00"),
            ],
            vacations: vec![vacation(alice.id, "2025-04-02", VacationType::Vacation)],
            expenses: vec![expense(alice.id, "2025-02-01", Decimal::ONE)],
        };

        let report = build_report(snapshot, Period::parse_month("2025-03").unwrap()).unwrap();
        assert_eq!(report.work_hours.len(), 1);
        assert!(report.vacations.is_empty());
        assert!(report.expenses.is_empty());
        assert_eq!(report.summary[0].total_minutes, 60);
    }

    #[test]
    fn test_unknown_owner_does_not_fail() {
        let alice = user("alice");
        let ghost = Uuid::new_v4();
        let snapshot = Snapshot {
            users: vec![alice.clone()],
            work_hours: vec![work(ghost, "2025-03-10", "10:00", "11:00")],
            vacations: vec![],
            expenses: vec![expense(ghost, "2025-03-10", Decimal::TWO)],
        };

        let report = build_report(snapshot, Period::all_time()).unwrap();
        assert_eq!(report.summary.len(), 2);

        let orphan = &report.summary[1];
        assert_eq!(orphan.user_id, ghost);
        assert_eq!(orphan.username, UNKNOWN_USERNAME);
        assert_eq!(orphan.role, None);
        assert_eq!(orphan.total_minutes, 60);
        assert_eq!(orphan.expense_total, Decimal::TWO);
    }

    #[test]
    fn test_expense_overflow_is_an_error() {
        let alice = user("alice");
        let snapshot = Snapshot {
            users: vec![alice.clone()],
            work_hours: vec![],
            vacations: vec![],
            expenses: vec![
                expense(alice.id, "2025-03-10", Decimal::MAX),
                expense(alice.id, "2025-03-11", Decimal::MAX),
            ],
        };

        let result = build_report(snapshot, Period::all_time());
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_largest_accepted_amounts_still_sum() {
        let alice = user("alice");
        let snapshot = Snapshot {
            users: vec![alice.clone()],
            work_hours: vec![],
            vacations: vec![],
            expenses: vec![
                expense(alice.id, "2025-03-10", MAX_AMOUNT),
                expense(alice.id, "2025-03-11", MAX_AMOUNT),
            ],
        };

        let report = build_report(snapshot, Period::all_time()).unwrap();
        assert_eq!(report.summary[0].expense_total, MAX_AMOUNT * Decimal::TWO);
    }
}
