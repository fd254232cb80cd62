use crate::domain_model::{Extra, NewSession, SessionRecord, generate_session_id};
use crate::domain_port::{SessionAdapter, SessionError};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::marker::PhantomData;

/// Table handles for the relational adapter. Names come from trusted
/// configuration, never from request input.
#[derive(Debug, Clone)]
pub struct SqlTables {
    pub users: String,
    pub sessions: String,
}

impl Default for SqlTables {
    fn default() -> Self {
        SqlTables {
            users: "user".to_string(),
            sessions: "session".to_string(),
        }
    }
}

/// Relational adapter over a shared MySQL pool.
///
/// Expected session schema:
///
/// ```sql
/// CREATE TABLE session (
///     id CHAR(36) PRIMARY KEY,
///     user_id VARCHAR(255) NOT NULL,
///     expires_at DATETIME(3) NOT NULL,
///     data TEXT NULL,
///     KEY idx_session_user_id (user_id)
/// );
/// ```
///
/// Extra creation fields are persisted verbatim as JSON in `data`. The user
/// table is the caller's own; `U` maps its rows. Expiry policy is eager: a
/// read that observes an expired row deletes it and fails.
pub struct MySqlSessionAdapter<U> {
    pool: MySqlPool,
    tables: SqlTables,
    _user: PhantomData<fn() -> U>,
}

impl<U> MySqlSessionAdapter<U>
where
    U: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Sync + Unpin + 'static,
{
    pub fn new(pool: MySqlPool, tables: SqlTables) -> Self {
        MySqlSessionAdapter {
            pool,
            tables,
            _user: PhantomData,
        }
    }

    /// Build the pool from a raw connection DSN.
    pub async fn connect(dsn: &str, tables: SqlTables) -> Result<Self, sqlx::Error> {
        let pool = MySqlPool::connect(dsn).await?;
        Ok(Self::new(pool, tables))
    }

    async fn fetch_user(&self, user_id: &str) -> Result<U, SessionError> {
        let user = sqlx::query_as::<_, U>(&format!(
            "SELECT * FROM {} WHERE id = ?",
            self.tables.users
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::backend("get user", e))?;

        user.ok_or(SessionError::UserNotFound)
    }
}

fn row_to_record(row: &MySqlRow) -> Result<SessionRecord, SessionError> {
    let naive = row.get::<NaiveDateTime, _>("expires_at");
    let data = row.get::<Option<String>, _>("data");
    let extra = match data.as_deref() {
        Some(json) if !json.is_empty() => serde_json::from_str::<Extra>(json)
            .map_err(|e| SessionError::backend("get session", e))?,
        _ => Extra::new(),
    };

    Ok(SessionRecord {
        id: row.get::<String, _>("id"),
        user_id: row.get::<String, _>("user_id"),
        expires_at: DateTime::from_naive_utc_and_offset(naive, Utc),
        extra,
    })
}

#[async_trait::async_trait]
impl<U> SessionAdapter<U> for MySqlSessionAdapter<U>
where
    U: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Sync + Unpin + 'static,
{
    async fn create_session(&self, new: NewSession) -> Result<SessionRecord, SessionError> {
        let record = new.into_record(generate_session_id());
        let data = if record.extra.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&record.extra)
                    .map_err(|e| SessionError::backend("create session", e))?,
            )
        };

        sqlx::query(&format!(
            "INSERT INTO {} (id, user_id, expires_at, data) VALUES (?, ?, ?, ?)",
            self.tables.sessions
        ))
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.expires_at.naive_utc())
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::backend("create session", e))?;

        Ok(record)
    }

    async fn get_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError> {
        let id = session_id.ok_or(SessionError::MissingSessionId)?;

        let row = sqlx::query(&format!(
            "SELECT id, user_id, expires_at, data FROM {} WHERE id = ?",
            self.tables.sessions
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SessionError::backend("get session", e))?;

        let row = row.ok_or(SessionError::SessionNotFound)?;
        let record = row_to_record(&row)?;
        if record.is_expired() {
            sqlx::query(&format!(
                "DELETE FROM {} WHERE id = ?",
                self.tables.sessions
            ))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| SessionError::backend("get session", e))?;
            return Err(SessionError::SessionExpired);
        }

        Ok(record)
    }

    async fn get_user_by_session_id(&self, session_id: Option<&str>) -> Result<U, SessionError> {
        let session = self.get_session(session_id).await?;
        self.fetch_user(&session.user_id).await
    }

    async fn get_user_by_user_id(&self, user_id: Option<&str>) -> Result<U, SessionError> {
        let id = user_id.ok_or(SessionError::MissingUserId)?;
        self.fetch_user(id).await
    }

    async fn delete_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError> {
        let record = self.get_session(session_id).await?;

        sqlx::query(&format!(
            "DELETE FROM {} WHERE id = ?",
            self.tables.sessions
        ))
        .bind(&record.id)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::backend("delete session", e))?;

        Ok(record)
    }

    async fn delete_users_all_sessions(
        &self,
        session_id: Option<&str>,
    ) -> Result<u64, SessionError> {
        let session = self.get_session(session_id).await?;

        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = ?",
            self.tables.sessions
        ))
        .bind(&session.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| SessionError::backend("delete all sessions", e))?;

        Ok(result.rows_affected())
    }
}
