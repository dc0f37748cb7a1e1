//! PostgreSQL store

use super::{Snapshot, Store};
use crate::error::{Error, Result};
use crate::records::{
    DateRange, ExpenseEntry, NewUser, User, UserRecord, VacationEntry, VacationInsert,
    VacationType, WithUsername, WorkHoursEntry, WriteAction,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Row};
use uuid::Uuid;

const SCHEMA: &str = include_str!("schema.sql");

const USER_COLUMNS: &str = "id, username, role, created_at";
const WORK_HOURS_COLUMNS: &str = "id, user_id, work_date, start_time, end_time, created_at";
const VACATION_COLUMNS: &str = "id, user_id, vacation_date, type, created_at";
const EXPENSE_COLUMNS: &str = "id, user_id, expense_date, description, amount, created_at";

/// Store backed by a single pipelined `tokio-postgres` client
pub struct PgStore {
    client: Client,
}

impl PgStore {
    /// Connect and spawn the connection driver
    pub async fn connect(url: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        tracing::info!("connected to PostgreSQL");
        Ok(Self { client })
    }

    /// Create any missing tables
    pub async fn migrate(&self) -> Result<()> {
        self.client.batch_execute(SCHEMA).await?;
        tracing::info!("database schema is up to date");
        Ok(())
    }

    async fn find_vacation(&self, owner: Uuid, date: NaiveDate) -> Result<Option<VacationEntry>> {
        let query = format!(
            "SELECT {VACATION_COLUMNS} FROM vacations WHERE user_id = $1 AND vacation_date = $2"
        );
        self.client
            .query_opt(&query, &[&owner, &date])
            .await?
            .map(|row| vacation_from_row(&row))
            .transpose()
    }
}

/// Translate a failed record write, turning a missing owner into [`Error::UserNotFound`]
fn owner_write_error(e: tokio_postgres::Error) -> Error {
    if e.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) {
        Error::UserNotFound
    } else {
        Error::Database(e)
    }
}

fn user_from_row(row: &Row) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        role: role
            .parse()
            .map_err(|e: String| Error::Internal(format!("bad role in users table: {e}")))?,
        created_at: row.try_get("created_at")?,
    })
}

fn work_hours_from_row(row: &Row) -> Result<WorkHoursEntry> {
    Ok(WorkHoursEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        work_date: row.try_get("work_date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        created_at: row.try_get("created_at")?,
    })
}

fn vacation_from_row(row: &Row) -> Result<VacationEntry> {
    let vacation_type: String = row.try_get("type")?;
    Ok(VacationEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        vacation_date: row.try_get("vacation_date")?,
        vacation_type: vacation_type
            .parse()
            .map_err(|e: String| Error::Internal(format!("bad type in vacations table: {e}")))?,
        created_at: row.try_get("created_at")?,
    })
}

fn expense_from_row(row: &Row) -> Result<ExpenseEntry> {
    Ok(ExpenseEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        expense_date: row.try_get("expense_date")?,
        description: row.try_get("description")?,
        amount: row.try_get("amount")?,
        created_at: row.try_get("created_at")?,
    })
}

fn with_username<T>(row: &Row, entry: T) -> Result<WithUsername<T>> {
    Ok(WithUsername {
        entry,
        username: row.try_get("username")?,
    })
}

fn action(row: &Row) -> Result<WriteAction> {
    let inserted: bool = row.try_get("inserted")?;
    Ok(if inserted {
        WriteAction::Created
    } else {
        WriteAction::Updated
    })
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        self.client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let query = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1 LIMIT 1"
        );
        match self.client.query_opt(&query, &[&username]).await? {
            Some(row) => Ok(Some(UserRecord {
                user: user_from_row(&row)?,
                password_hash: row.try_get("password_hash")?,
            })),
            None => Ok(None),
        }
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        self.client
            .query_opt(&query, &[&id])
            .await?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        self.client
            .query(&query, &[])
            .await?
            .iter()
            .map(user_from_row)
            .collect()
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (id, username, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        let row = self
            .client
            .query_one(
                &query,
                &[
                    &Uuid::new_v4(),
                    &user.username,
                    &user.password_hash,
                    &user.role.as_str(),
                ],
            )
            .await
            .map_err(|e| {
                if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
                    Error::Conflict {
                        message: "Username already exists".to_string(),
                        existing: None,
                    }
                } else {
                    Error::Database(e)
                }
            })?;
        user_from_row(&row)
    }

    async fn delete_user_cascade(&self, id: Uuid) -> Result<bool> {
        // One statement, so the children and the user go together or not at all
        let deleted = self
            .client
            .execute(
                "WITH wh AS (DELETE FROM work_hours WHERE user_id = $1),
                      v AS (DELETE FROM vacations WHERE user_id = $1),
                      e AS (DELETE FROM expenses WHERE user_id = $1)
                 DELETE FROM users WHERE id = $1",
                &[&id],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn upsert_work_hours(
        &self,
        owner: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<(WorkHoursEntry, WriteAction)> {
        let query = format!(
            "INSERT INTO work_hours (id, user_id, work_date, start_time, end_time)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, work_date)
             DO UPDATE SET start_time = EXCLUDED.start_time, end_time = EXCLUDED.end_time
             RETURNING {WORK_HOURS_COLUMNS}, (xmax = 0) AS inserted"
        );
        let row = self
            .client
            .query_one(&query, &[&Uuid::new_v4(), &owner, &date, &start, &end])
            .await
            .map_err(owner_write_error)?;
        Ok((work_hours_from_row(&row)?, action(&row)?))
    }

    async fn list_work_hours(&self, owner: Uuid) -> Result<Vec<WorkHoursEntry>> {
        let query = format!(
            "SELECT {WORK_HOURS_COLUMNS} FROM work_hours
             WHERE user_id = $1
             ORDER BY work_date DESC"
        );
        self.client
            .query(&query, &[&owner])
            .await?
            .iter()
            .map(work_hours_from_row)
            .collect()
    }

    async fn list_all_work_hours(&self) -> Result<Vec<WithUsername<WorkHoursEntry>>> {
        let rows = self
            .client
            .query(
                "SELECT wh.id, wh.user_id, wh.work_date, wh.start_time, wh.end_time,
                        wh.created_at, u.username
                 FROM work_hours wh
                 LEFT JOIN users u ON u.id = wh.user_id
                 ORDER BY wh.work_date DESC, u.username ASC",
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| with_username(row, work_hours_from_row(row)?))
            .collect()
    }

    async fn delete_work_hours(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let deleted = self
            .client
            .execute(
                "DELETE FROM work_hours WHERE id = $1 AND user_id = $2",
                &[&id, &owner],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn insert_vacation(
        &self,
        owner: Uuid,
        date: NaiveDate,
        vacation_type: VacationType,
    ) -> Result<VacationInsert> {
        let query = format!(
            "INSERT INTO vacations (id, user_id, vacation_date, type)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, vacation_date) DO NOTHING
             RETURNING {VACATION_COLUMNS}"
        );
        let inserted = self
            .client
            .query_opt(
                &query,
                &[&Uuid::new_v4(), &owner, &date, &vacation_type.as_str()],
            )
            .await
            .map_err(owner_write_error)?;

        if let Some(row) = inserted {
            return Ok(VacationInsert::Created(vacation_from_row(&row)?));
        }

        self.find_vacation(owner, date)
            .await?
            .map(VacationInsert::Exists)
            .ok_or_else(|| Error::Internal("vacation conflict without a visible row".to_string()))
    }

    async fn upsert_vacation(
        &self,
        owner: Uuid,
        date: NaiveDate,
        vacation_type: VacationType,
    ) -> Result<(VacationEntry, WriteAction)> {
        let query = format!(
            "INSERT INTO vacations (id, user_id, vacation_date, type)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, vacation_date)
             DO UPDATE SET type = EXCLUDED.type
             RETURNING {VACATION_COLUMNS}, (xmax = 0) AS inserted"
        );
        let row = self
            .client
            .query_one(
                &query,
                &[&Uuid::new_v4(), &owner, &date, &vacation_type.as_str()],
            )
            .await
            .map_err(owner_write_error)?;
        Ok((vacation_from_row(&row)?, action(&row)?))
    }

    async fn list_vacations(&self, owner: Uuid) -> Result<Vec<VacationEntry>> {
        let query = format!(
            "SELECT {VACATION_COLUMNS} FROM vacations
             WHERE user_id = $1
             ORDER BY vacation_date DESC"
        );
        self.client
            .query(&query, &[&owner])
            .await?
            .iter()
            .map(vacation_from_row)
            .collect()
    }

    async fn list_all_vacations(&self) -> Result<Vec<WithUsername<VacationEntry>>> {
        let rows = self
            .client
            .query(
                "SELECT v.id, v.user_id, v.vacation_date, v.type, v.created_at, u.username
                 FROM vacations v
                 LEFT JOIN users u ON u.id = v.user_id
                 ORDER BY v.vacation_date DESC, u.username ASC",
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| with_username(row, vacation_from_row(row)?))
            .collect()
    }

    async fn delete_vacation(&self, owner: Uuid, date: NaiveDate) -> Result<u64> {
        Ok(self
            .client
            .execute(
                "DELETE FROM vacations WHERE user_id = $1 AND vacation_date = $2",
                &[&owner, &date],
            )
            .await?)
    }

    async fn insert_expense(
        &self,
        owner: Uuid,
        date: NaiveDate,
        description: &str,
        amount: Decimal,
    ) -> Result<ExpenseEntry> {
        let query = format!(
            "INSERT INTO expenses (id, user_id, expense_date, description, amount)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {EXPENSE_COLUMNS}"
        );
        let row = self
            .client
            .query_one(
                &query,
                &[&Uuid::new_v4(), &owner, &date, &description, &amount],
            )
            .await
            .map_err(owner_write_error)?;
        expense_from_row(&row)
    }

    async fn list_expenses(&self, owner: Uuid) -> Result<Vec<ExpenseEntry>> {
        let query = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses
             WHERE user_id = $1
             ORDER BY expense_date DESC, created_at DESC"
        );
        self.client
            .query(&query, &[&owner])
            .await?
            .iter()
            .map(expense_from_row)
            .collect()
    }

    async fn list_all_expenses(&self) -> Result<Vec<WithUsername<ExpenseEntry>>> {
        let rows = self
            .client
            .query(
                "SELECT e.id, e.user_id, e.expense_date, e.description, e.amount,
                        e.created_at, u.username
                 FROM expenses e
                 LEFT JOIN users u ON u.id = e.user_id
                 ORDER BY e.expense_date DESC, e.created_at DESC",
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| with_username(row, expense_from_row(row)?))
            .collect()
    }

    async fn delete_expense(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let deleted = self
            .client
            .execute(
                "DELETE FROM expenses WHERE id = $1 AND user_id = $2",
                &[&id, &owner],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn snapshot(&self, range: Option<DateRange>) -> Result<Snapshot> {
        let from: Option<NaiveDate> = range.map(|r| r.from);
        let to: Option<NaiveDate> = range.map(|r| r.to);

        let users = self
            .client
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"),
                &[],
            )
            .await?;

        let work_hours = self
            .client
            .query(
                &format!(
                    "SELECT {WORK_HOURS_COLUMNS} FROM work_hours
                     WHERE ($1::date IS NULL OR work_date >= $1)
                       AND ($2::date IS NULL OR work_date <= $2)
                     ORDER BY work_date"
                ),
                &[&from, &to],
            )
            .await?;

        let vacations = self
            .client
            .query(
                &format!(
                    "SELECT {VACATION_COLUMNS} FROM vacations
                     WHERE ($1::date IS NULL OR vacation_date >= $1)
                       AND ($2::date IS NULL OR vacation_date <= $2)
                     ORDER BY vacation_date"
                ),
                &[&from, &to],
            )
            .await?;

        let expenses = self
            .client
            .query(
                &format!(
                    "SELECT {EXPENSE_COLUMNS} FROM expenses
                     WHERE ($1::date IS NULL OR expense_date >= $1)
                       AND ($2::date IS NULL OR expense_date <= $2)
                     ORDER BY expense_date"
                ),
                &[&from, &to],
            )
            .await?;

        Ok(Snapshot {
            users: users.iter().map(user_from_row).collect::<Result<_>>()?,
            work_hours: work_hours
                .iter()
                .map(work_hours_from_row)
                .collect::<Result<_>>()?,
            vacations: vacations
                .iter()
                .map(vacation_from_row)
                .collect::<Result<_>>()?,
            expenses: expenses
                .iter()
                .map(expense_from_row)
                .collect::<Result<_>>()?,
        })
    }
}
