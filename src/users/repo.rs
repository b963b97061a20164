use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use crate::error::AppError;
use crate::users::repo_types::{NewUser, User, UserChanges};

/// Columns that carry a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    PhoneNumber,
    Username,
}

impl UniqueField {
    /// Detail returned to callers when the value is already taken.
    pub fn conflict_message(self) -> &'static str {
        match self {
            Self::Email => "Email already exists",
            Self::PhoneNumber => "Phone number already exists",
            Self::Username => "Username is used",
        }
    }

    fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "users_email_key" => Some(Self::Email),
            "users_phone_number_key" => Some(Self::PhoneNumber),
            "users_username_key" => Some(Self::Username),
            _ => None,
        }
    }

    fn lookup_sql(self) -> &'static str {
        match self {
            Self::Email => {
                "SELECT id, name, age, dob, address, phone_number, email, username, password_hash \
                 FROM users WHERE email = $1 LIMIT 1"
            }
            Self::PhoneNumber => {
                "SELECT id, name, age, dob, address, phone_number, email, username, password_hash \
                 FROM users WHERE phone_number = $1 LIMIT 1"
            }
            Self::Username => {
                "SELECT id, name, age, dob, address, phone_number, email, username, password_hash \
                 FROM users WHERE username = $1 LIMIT 1"
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0:?}")]
    Duplicate(UniqueField),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => AppError::Conflict(field.conflict_message().into()),
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e).context("user store")),
        }
    }
}

/// Persistent storage for users, injected into request handlers through `AppState`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_unique(&self, field: UniqueField, value: &str) -> Result<Option<User>, StoreError>;
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    async fn get(&self, id: i64) -> Result<Option<User>, StoreError>;
    /// Returns `None` when no row has this id.
    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError>;
    /// Returns `false` when no row has this id.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Turns a unique-constraint violation into [`StoreError::Duplicate`].
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            if let Some(field) = db_err.constraint().and_then(UniqueField::from_constraint) {
                debug!(?field, "unique constraint rejected write");
                return StoreError::Duplicate(field);
            }
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_unique(&self, field: UniqueField, value: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(field.lookup_sql())
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, age, dob, address, phone_number, email, username, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, age, dob, address, phone_number, email, username, password_hash
            "#,
        )
        .bind(user.name)
        .bind(user.age)
        .bind(user.dob)
        .bind(user.address)
        .bind(user.phone_number)
        .bind(user.email)
        .bind(user.username)
        .bind(user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, age, dob, address, phone_number, email, username, password_hash
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, age, dob, address, phone_number, email, username, password_hash
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError> {
        // NULL parameters leave the column as it is
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name          = COALESCE($2, name),
                   age           = COALESCE($3, age),
                   dob           = COALESCE($4, dob),
                   address       = COALESCE($5, address),
                   phone_number  = COALESCE($6, phone_number),
                   email         = COALESCE($7, email),
                   username      = COALESCE($8, username),
                   password_hash = COALESCE($9, password_hash)
             WHERE id = $1
            RETURNING id, name, age, dob, address, phone_number, email, username, password_hash
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.age)
        .bind(changes.dob)
        .bind(changes.address)
        .bind(changes.phone_number)
        .bind(changes.email)
        .bind(changes.username)
        .bind(changes.password_hash)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
