//! Persistence for users and their records

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::records::{
    DateRange, ExpenseEntry, NewUser, User, UserRecord, VacationEntry, VacationInsert,
    VacationType, WithUsername, WorkHoursEntry, WriteAction,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Everything the export needs, read in one go
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub work_hours: Vec<WorkHoursEntry>,
    pub vacations: Vec<VacationEntry>,
    pub expenses: Vec<ExpenseEntry>,
}

/// Storage backend.
///
/// Implementations enforce uniqueness of usernames and of the
/// (owner, date) key for work hours and vacations, and reject writes for
/// owners that do not exist with [`Error::UserNotFound`](crate::Error::UserNotFound).
#[async_trait]
pub trait Store: Send + Sync {
    /// Check the backend is reachable
    async fn ping(&self) -> Result<()>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    /// Create an account. A taken username is a
    /// [`Error::Conflict`](crate::Error::Conflict).
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Remove a user and every record they own as one atomic step.
    /// Returns `false` if no such user existed.
    async fn delete_user_cascade(&self, id: Uuid) -> Result<bool>;

    /// Insert or replace the work hours for (owner, date)
    async fn upsert_work_hours(
        &self,
        owner: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<(WorkHoursEntry, WriteAction)>;

    async fn list_work_hours(&self, owner: Uuid) -> Result<Vec<WorkHoursEntry>>;

    async fn list_all_work_hours(&self) -> Result<Vec<WithUsername<WorkHoursEntry>>>;

    /// Delete one of `owner`'s work-hours rows; `false` if it was not theirs or absent
    async fn delete_work_hours(&self, owner: Uuid, id: Uuid) -> Result<bool>;

    /// Insert a vacation unless (owner, date) is already taken
    async fn insert_vacation(
        &self,
        owner: Uuid,
        date: NaiveDate,
        vacation_type: VacationType,
    ) -> Result<VacationInsert>;

    /// Insert a vacation or replace the type of the existing one
    async fn upsert_vacation(
        &self,
        owner: Uuid,
        date: NaiveDate,
        vacation_type: VacationType,
    ) -> Result<(VacationEntry, WriteAction)>;

    async fn list_vacations(&self, owner: Uuid) -> Result<Vec<VacationEntry>>;

    async fn list_all_vacations(&self) -> Result<Vec<WithUsername<VacationEntry>>>;

    /// Delete `owner`'s vacation on `date`, returning how many rows went
    async fn delete_vacation(&self, owner: Uuid, date: NaiveDate) -> Result<u64>;

    async fn insert_expense(
        &self,
        owner: Uuid,
        date: NaiveDate,
        description: &str,
        amount: Decimal,
    ) -> Result<ExpenseEntry>;

    async fn list_expenses(&self, owner: Uuid) -> Result<Vec<ExpenseEntry>>;

    async fn list_all_expenses(&self) -> Result<Vec<WithUsername<ExpenseEntry>>>;

    /// Delete one of `owner`'s expenses; `false` if it was not theirs or absent
    async fn delete_expense(&self, owner: Uuid, id: Uuid) -> Result<bool>;

    /// All users plus the records dated inside `range` (everything when `None`)
    async fn snapshot(&self, range: Option<DateRange>) -> Result<Snapshot>;
}

pub type SharedStore = Arc<dyn Store>;

/// Open the store named by the configuration and make sure its schema exists
pub async fn connect(config: &DatabaseConfig) -> Result<SharedStore> {
    if config.is_memory() {
        tracing::warn!("using in-memory store, records are lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgStore::connect(&config.url).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}
