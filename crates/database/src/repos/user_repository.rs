//! User repository for database operations.

use crate::entities::{CreateUserRequest, UpdateUserRequest, User, UserCredentials};
use crate::types::{now_timestamp, DatabaseError, DatabaseResult};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, info};

pub(crate) const USER_COLUMNS: &str =
    "u.id, u.phone_number, u.first_name, u.last_name, u.date_of_birth, u.created_at, u.updated_at";

pub(crate) fn user_from_row(row: &SqliteRow) -> DatabaseResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        phone_number: row.try_get("phone_number")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        date_of_birth: row.try_get("date_of_birth")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_by_phone_number(&self, phone_number: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.phone_number = ?"
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Fetch every user whose phone number is in `phone_numbers`.
    ///
    /// Unknown numbers are simply absent from the result; callers compare the
    /// returned set against their input to report them.
    pub async fn find_by_phone_numbers(&self, phone_numbers: &[String]) -> DatabaseResult<Vec<User>> {
        if phone_numbers.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.phone_number IN ("
        ));
        let mut separated = builder.separated(", ");
        for phone_number in phone_numbers {
            separated.push_bind(phone_number);
        }
        separated.push_unseparated(") ORDER BY u.id");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    /// Look up a user with its password hash, for login.
    pub async fn find_credentials(&self, phone_number: &str) -> DatabaseResult<Option<UserCredentials>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.phone_number = ?"
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(UserCredentials {
                user: user_from_row(&row)?,
                password_hash: row.try_get("password_hash")?,
            })),
            None => Ok(None),
        }
    }

    /// Insert a user. A taken phone number surfaces as `Conflict(PhoneNumber)`.
    pub async fn create(&self, request: &CreateUserRequest) -> DatabaseResult<User> {
        let now = now_timestamp();

        let result = sqlx::query(
            "INSERT INTO users (phone_number, first_name, last_name, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.phone_number)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let user_id = result.last_insert_rowid();
        info!(user_id, phone_number = %request.phone_number, "created user");

        Ok(User {
            id: user_id,
            phone_number: request.phone_number.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            date_of_birth: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub async fn update(&self, id: i64, request: &UpdateUserRequest) -> DatabaseResult<User> {
        let now = now_timestamp();

        let result = sqlx::query(
            "UPDATE users SET
                phone_number = COALESCE(?, phone_number),
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                date_of_birth = CASE WHEN ? THEN ? ELSE date_of_birth END,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&request.phone_number)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(request.date_of_birth.is_some())
        .bind(request.date_of_birth.as_ref().and_then(Option::as_deref))
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found(format!("user {id}")));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("user {id}")))
    }

    /// Users whose phone number or first name contains `query`, excluding `exclude_id`.
    pub async fn search(&self, query: &str, exclude_id: i64) -> DatabaseResult<Vec<User>> {
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users u
             WHERE u.id != ?
               AND (u.phone_number LIKE ? ESCAPE '\\' OR u.first_name LIKE ? ESCAPE '\\')
             ORDER BY u.id"
        ))
        .bind(exclude_id)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        debug!(query, matches = rows.len(), "searched users");
        rows.iter().map(user_from_row).collect()
    }

    pub async fn list_all(&self) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.id"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
