use serde::Serialize;
use sqlx::FromRow;

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub dob: String,
    pub address: String,
    pub phone_number: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // never leaves the server
}

/// Values for an insert; the id comes from the database.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub age: i32,
    pub dob: String,
    pub address: String,
    pub phone_number: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Columns to overwrite on update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub dob: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}
