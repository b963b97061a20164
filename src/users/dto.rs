use std::borrow::Cow;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::users::repo_types::User;

/// Request body for POST /users/. A client-supplied `id` is ignored.
///
/// Validated fields are kept as the JSON the client sent; type mismatches are
/// reported by the validator for that field, after the uniqueness checks.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub age: Value,
    pub dob: Value,
    pub address: String,
    pub phone_number: Value,
    pub email: Value,
    pub username: Value,
    pub password: String,
}

/// Text a raw field is looked up by: strings as is, anything else as its JSON form.
pub fn lookup_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// Request body for PATCH /users/{id}. Absent or null fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_int_opt")]
    pub age: Option<i32>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub message: &'static str,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub client_ip: String,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UpdatedUserResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

impl IntOrString {
    fn into_i32<E: de::Error>(self) -> Result<i32, E> {
        match self {
            Self::Int(n) => i32::try_from(n).map_err(|_| E::custom(format!("integer out of range: {n}"))),
            Self::Str(s) => s
                .trim()
                .parse::<i32>()
                .map_err(|_| E::custom(format!("input should be a valid integer, got {s:?}"))),
        }
    }
}

/// Accepts `31` as well as `"31"`.
fn lenient_int_opt<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<IntOrString>::deserialize(deserializer)?
        .map(IntOrString::into_i32)
        .transpose()
}
