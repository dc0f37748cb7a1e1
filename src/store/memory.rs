//! In-process store, for local runs and tests

use super::{Snapshot, Store};
use crate::error::{Error, Result};
use crate::records::{
    DateRange, ExpenseEntry, NewUser, User, UserRecord, VacationEntry, VacationInsert,
    VacationType, WithUsername, WorkHoursEntry, WriteAction,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    work_hours: Vec<WorkHoursEntry>,
    vacations: Vec<VacationEntry>,
    expenses: Vec<ExpenseEntry>,
}

impl Tables {
    fn ensure_user(&self, id: Uuid) -> Result<()> {
        if self.users.iter().any(|u| u.user.id == id) {
            Ok(())
        } else {
            Err(Error::UserNotFound)
        }
    }

    fn username_of(&self, id: Uuid) -> Option<String> {
        self.users
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.username.clone())
    }

    fn with_username<T: Clone>(&self, owner: Uuid, entry: &T) -> WithUsername<T> {
        WithUsername {
            entry: entry.clone(),
            username: self.username_of(owner),
        }
    }
}

/// Store that keeps everything in memory behind one lock.
///
/// Each operation takes the lock once, so check-then-write sequences are
/// atomic just like the single statements of the PostgreSQL store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.user.username == username)
            .cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone()))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().rev().map(|u| u.user.clone()).collect())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.user.username == new_user.username)
        {
            return Err(Error::Conflict {
                message: "Username already exists".to_string(),
                existing: None,
            });
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            role: new_user.role,
            created_at: Utc::now(),
        };
        tables.users.push(UserRecord {
            user: user.clone(),
            password_hash: new_user.password_hash,
        });
        Ok(user)
    }

    async fn delete_user_cascade(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.user.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        tables.work_hours.retain(|w| w.user_id != id);
        tables.vacations.retain(|v| v.user_id != id);
        tables.expenses.retain(|e| e.user_id != id);
        Ok(true)
    }

    async fn upsert_work_hours(
        &self,
        owner: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<(WorkHoursEntry, WriteAction)> {
        let mut tables = self.tables.write().await;
        tables.ensure_user(owner)?;

        if let Some(existing) = tables
            .work_hours
            .iter_mut()
            .find(|w| w.user_id == owner && w.work_date == date)
        {
            existing.start_time = start;
            existing.end_time = end;
            return Ok((existing.clone(), WriteAction::Updated));
        }

        let entry = WorkHoursEntry {
            id: Uuid::new_v4(),
            user_id: owner,
            work_date: date,
            start_time: start,
            end_time: end,
            created_at: Utc::now(),
        };
        tables.work_hours.push(entry.clone());
        Ok((entry, WriteAction::Created))
    }

    async fn list_work_hours(&self, owner: Uuid) -> Result<Vec<WorkHoursEntry>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .work_hours
            .iter()
            .filter(|w| w.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by_key(|w| Reverse(w.work_date));
        Ok(rows)
    }

    async fn list_all_work_hours(&self) -> Result<Vec<WithUsername<WorkHoursEntry>>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .work_hours
            .iter()
            .map(|w| tables.with_username(w.user_id, w))
            .collect();
        rows.sort_by(|a, b| {
            b.entry
                .work_date
                .cmp(&a.entry.work_date)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(rows)
    }

    async fn delete_work_hours(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.work_hours.len();
        tables
            .work_hours
            .retain(|w| !(w.id == id && w.user_id == owner));
        Ok(tables.work_hours.len() < before)
    }

    async fn insert_vacation(
        &self,
        owner: Uuid,
        date: NaiveDate,
        vacation_type: VacationType,
    ) -> Result<VacationInsert> {
        let mut tables = self.tables.write().await;
        tables.ensure_user(owner)?;

        if let Some(existing) = tables
            .vacations
            .iter()
            .find(|v| v.user_id == owner && v.vacation_date == date)
        {
            return Ok(VacationInsert::Exists(existing.clone()));
        }

        let entry = VacationEntry {
            id: Uuid::new_v4(),
            user_id: owner,
            vacation_date: date,
            vacation_type,
            created_at: Utc::now(),
        };
        tables.vacations.push(entry.clone());
        Ok(VacationInsert::Created(entry))
    }

    async fn upsert_vacation(
        &self,
        owner: Uuid,
        date: NaiveDate,
        vacation_type: VacationType,
    ) -> Result<(VacationEntry, WriteAction)> {
        let mut tables = self.tables.write().await;
        tables.ensure_user(owner)?;

        if let Some(existing) = tables
            .vacations
            .iter_mut()
            .find(|v| v.user_id == owner && v.vacation_date == date)
        {
            existing.vacation_type = vacation_type;
            return Ok((existing.clone(), WriteAction::Updated));
        }

        let entry = VacationEntry {
            id: Uuid::new_v4(),
            user_id: owner,
            vacation_date: date,
            vacation_type,
            created_at: Utc::now(),
        };
        tables.vacations.push(entry.clone());
        Ok((entry, WriteAction::Created))
    }

    async fn list_vacations(&self, owner: Uuid) -> Result<Vec<VacationEntry>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .vacations
            .iter()
            .filter(|v| v.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by_key(|v| Reverse(v.vacation_date));
        Ok(rows)
    }

    async fn list_all_vacations(&self) -> Result<Vec<WithUsername<VacationEntry>>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .vacations
            .iter()
            .map(|v| tables.with_username(v.user_id, v))
            .collect();
        rows.sort_by_key(|v| Reverse(v.entry.vacation_date));
        Ok(rows)
    }

    async fn delete_vacation(&self, owner: Uuid, date: NaiveDate) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.vacations.len();
        tables
            .vacations
            .retain(|v| !(v.user_id == owner && v.vacation_date == date));
        Ok((before - tables.vacations.len()) as u64)
    }

    async fn insert_expense(
        &self,
        owner: Uuid,
        date: NaiveDate,
        description: &str,
        amount: Decimal,
    ) -> Result<ExpenseEntry> {
        let mut tables = self.tables.write().await;
        tables.ensure_user(owner)?;

        let entry = ExpenseEntry {
            id: Uuid::new_v4(),
            user_id: owner,
            expense_date: date,
            description: description.to_string(),
            amount,
            created_at: Utc::now(),
        };
        tables.expenses.push(entry.clone());
        Ok(entry)
    }

    async fn list_expenses(&self, owner: Uuid) -> Result<Vec<ExpenseEntry>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .expenses
            .iter()
            .filter(|e| e.user_id == owner)
            .cloned()
            .collect();
        rows.sort_by_key(|e| Reverse((e.expense_date, e.created_at)));
        Ok(rows)
    }

    async fn list_all_expenses(&self) -> Result<Vec<WithUsername<ExpenseEntry>>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .expenses
            .iter()
            .map(|e| tables.with_username(e.user_id, e))
            .collect();
        rows.sort_by_key(|e| Reverse((e.entry.expense_date, e.entry.created_at)));
        Ok(rows)
    }

    async fn delete_expense(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.expenses.len();
        tables
            .expenses
            .retain(|e| !(e.id == id && e.user_id == owner));
        Ok(tables.expenses.len() < before)
    }

    async fn snapshot(&self, range: Option<DateRange>) -> Result<Snapshot> {
        let tables = self.tables.read().await;
        let in_range = |date: NaiveDate| range.map_or(true, |r| r.contains(date));

        let mut work_hours: Vec<_> = tables
            .work_hours
            .iter()
            .filter(|w| in_range(w.work_date))
            .cloned()
            .collect();
        work_hours.sort_by_key(|w| w.work_date);

        Ok(Snapshot {
            users: tables.users.iter().map(|u| u.user.clone()).collect(),
            work_hours,
            vacations: tables
                .vacations
                .iter()
                .filter(|v| in_range(v.vacation_date))
                .cloned()
                .collect(),
            expenses: tables
                .expenses
                .iter()
                .filter(|e| in_range(e.expense_date))
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::UserRole;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    async fn add_user(store: &MemoryStore, username: &str) -> User {
        store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Employee,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        add_user(&store, "alice").await;

        let result = store
            .create_user(NewUser {
                username: "alice".to_string(),
                password_hash: "other".to_string(),
                role: UserRole::Manager,
            })
            .await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        // Usernames are case sensitive
        assert!(store
            .create_user(NewUser {
                username: "Alice".to_string(),
                password_hash: "other".to_string(),
                role: UserRole::Employee,
            })
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_work_hours_upsert_keeps_one_row() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice").await;

        let (first, action) = store
            .upsert_work_hours(alice.id, date("2025-03-10"), time("09:00"), time("17:00"))
            .await
            .unwrap();
        assert_eq!(action, WriteAction::Created);

        let (second, action) = store
            .upsert_work_hours(alice.id, date("2025-03-10"), time("09:00"), time("18:00"))
            .await
            .unwrap();
        assert_eq!(action, WriteAction::Updated);
        assert_eq!(first.id, second.id);

        let rows = store.list_work_hours(alice.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].end_time, time("18:00"));
    }

    #[tokio::test]
    async fn test_writes_for_unknown_owner_are_rejected() {
        let store = MemoryStore::new();
        let ghost = Uuid::new_v4();

        let result = store
            .upsert_work_hours(ghost, date("2025-03-10"), time("09:00"), time("17:00"))
            .await;
        assert!(matches!(result, Err(Error::UserNotFound)));

        let result = store
            .insert_expense(ghost, date("2025-03-10"), "Taxi", Decimal::ONE)
            .await;
        assert!(matches!(result, Err(Error::UserNotFound)));
    }

    #[tokio::test]
    async fn test_vacation_insert_does_not_overwrite() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice").await;
        let day = date("2025-03-11");

        let created = store
            .insert_vacation(alice.id, day, VacationType::Vacation)
            .await
            .unwrap();
        assert!(matches!(created, VacationInsert::Created(_)));

        match store.insert_vacation(alice.id, day, VacationType::Sick).await.unwrap() {
            VacationInsert::Exists(existing) => {
                assert_eq!(existing.vacation_type, VacationType::Vacation)
            }
            other => panic!("expected existing vacation, got {other:?}"),
        }

        let (entry, action) = store
            .upsert_vacation(alice.id, day, VacationType::Sick)
            .await
            .unwrap();
        assert_eq!(action, WriteAction::Updated);
        assert_eq!(entry.vacation_type, VacationType::Sick);
        assert_eq!(store.list_vacations(alice.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_owner_scoped_deletes() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice").await;
        let bob = add_user(&store, "bob").await;

        let expense = store
            .insert_expense(alice.id, date("2025-03-12"), "Lunch", Decimal::new(1250, 2))
            .await
            .unwrap();

        assert!(!store.delete_expense(bob.id, expense.id).await.unwrap());
        assert_eq!(store.list_expenses(alice.id).await.unwrap().len(), 1);
        assert!(store.delete_expense(alice.id, expense.id).await.unwrap());
        assert!(!store.delete_expense(alice.id, expense.id).await.unwrap());

        assert_eq!(
            store.delete_vacation(alice.id, date("2025-01-01")).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_cascade_delete() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice").await;
        let bob = add_user(&store, "bob").await;
        let day = date("2025-03-10");

        store
            .upsert_work_hours(alice.id, day, time("09:00"), time("17:00"))
            .await
            .unwrap();
        store
            .insert_vacation(alice.id, date("2025-03-11"), VacationType::Reserve)
            .await
            .unwrap();
        store
            .insert_expense(alice.id, day, "Parking", Decimal::TEN)
            .await
            .unwrap();
        store
            .upsert_work_hours(bob.id, day, time("08:00"), time("16:00"))
            .await
            .unwrap();

        assert!(store.delete_user_cascade(alice.id).await.unwrap());
        assert!(store.find_user(alice.id).await.unwrap().is_none());

        let snapshot = store.snapshot(None).await.unwrap();
        assert_eq!(snapshot.users.len(), 1);
        assert!(snapshot.work_hours.iter().all(|w| w.user_id == bob.id));
        assert!(snapshot.vacations.is_empty());
        assert!(snapshot.expenses.is_empty());

        assert!(!store.delete_user_cascade(alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_filters_by_range() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice").await;

        for d in ["2025-02-28", "2025-03-01", "2025-03-31", "2025-04-01"] {
            store
                .upsert_work_hours(alice.id, date(d), time("09:00"), time("10:00"))
                .await
                .unwrap();
        }

        let march = DateRange {
            from: date("2025-03-01"),
            to: date("2025-03-31"),
        };
        let snapshot = store.snapshot(Some(march)).await.unwrap();
        let dates: Vec<_> = snapshot.work_hours.iter().map(|w| w.work_date).collect();
        assert_eq!(dates, vec![date("2025-03-01"), date("2025-03-31")]);
    }

    #[tokio::test]
    async fn test_all_listings_carry_username() {
        let store = MemoryStore::new();
        let alice = add_user(&store, "alice").await;
        store
            .insert_vacation(alice.id, date("2025-03-11"), VacationType::Vacation)
            .await
            .unwrap();

        let rows = store.list_all_vacations().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username.as_deref(), Some("alice"));
    }
}
