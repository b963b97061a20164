use time::Date;
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;
use crate::users::dto::{lookup_text, CreateUserRequest, UpdateUserRequest};
use crate::users::password::hash_password_blocking;
use crate::users::repo::UniqueField;
use crate::users::repo_types::{NewUser, User, UserChanges};
use crate::users::validation::{
    age_matches_dob, coerce_age, is_age_valid, is_dob_valid_on, is_email_valid,
    is_phone_number_valid, is_username_valid, today,
};

/// Creates a user and returns its id.
///
/// Uniqueness is checked before any format check, so a duplicate email is
/// reported as a conflict even when the rest of the payload is malformed.
/// The store's unique constraints still decide races between concurrent creates.
pub async fn create_user(st: &AppState, req: CreateUserRequest) -> Result<i64, AppError> {
    for (field, value) in [
        (UniqueField::Email, &req.email),
        (UniqueField::PhoneNumber, &req.phone_number),
        (UniqueField::Username, &req.username),
    ] {
        if st.store.find_by_unique(field, &lookup_text(value)).await?.is_some() {
            warn!(?field, "create rejected: value already taken");
            return Err(AppError::Conflict(field.conflict_message().into()));
        }
    }

    let checked = validate_new_user(&req, today(), st.config.strict_age_dob_check)?;

    let password_hash = hash_password_blocking(req.password).await?;
    let user = st
        .store
        .insert(NewUser {
            name: req.name,
            age: checked.age,
            dob: checked.dob,
            address: req.address,
            phone_number: checked.phone_number,
            email: checked.email,
            username: checked.username,
            password_hash,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "insert rejected");
            AppError::from(e)
        })?;

    info!(user_id = user.id, username = %user.username, "user created");
    Ok(user.id)
}

/// Create fields that passed validation, in their stored types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedFields {
    pub email: String,
    pub phone_number: String,
    pub age: i32,
    pub dob: String,
    pub username: String,
}

/// Format checks for a create, in reporting order.
pub fn validate_new_user(
    req: &CreateUserRequest,
    today: Date,
    strict_age_dob: bool,
) -> Result<CheckedFields, AppError> {
    let invalid = |msg: &str| {
        warn!(reason = msg, "create rejected: invalid input");
        AppError::InvalidFormat(msg.into())
    };

    let Some(email) = req.email.as_str().filter(|_| is_email_valid(&req.email)) else {
        return Err(invalid("Invalid email format"));
    };
    let Some(phone_number) = req.phone_number.as_str().filter(|p| is_phone_number_valid(p)) else {
        return Err(invalid("Invalid phone number format"));
    };
    let Some(age) = coerce_age(&req.age).filter(|_| is_age_valid(&req.age)) else {
        return Err(invalid("Invalid age format"));
    };
    let Some(dob) = req.dob.as_str().filter(|d| is_dob_valid_on(d, today)) else {
        return Err(invalid("Invalid dob format"));
    };
    let Some(username) = req.username.as_str().filter(|_| is_username_valid(&req.username)) else {
        return Err(invalid("Invalid username format"));
    };
    if strict_age_dob {
        if let Err(msg) = age_matches_dob(age, dob, today) {
            return Err(invalid(msg.as_str()));
        }
    }

    Ok(CheckedFields {
        email: email.to_owned(),
        phone_number: phone_number.to_owned(),
        age,
        dob: dob.to_owned(),
        username: username.to_owned(),
    })
}

pub async fn list_users(st: &AppState) -> Result<Vec<User>, AppError> {
    Ok(st.store.list().await?)
}

pub async fn get_user(st: &AppState, id: i64) -> Result<User, AppError> {
    st.store.get(id).await?.ok_or_else(AppError::user_not_found)
}

/// Applies the fields present in `req`. Values are stored as given, without
/// format or uniqueness checks.
pub async fn update_user(st: &AppState, id: i64, req: UpdateUserRequest) -> Result<User, AppError> {
    let password_hash = match req.password {
        Some(plain) => Some(hash_password_blocking(plain).await?),
        None => None,
    };
    let changes = UserChanges {
        name: req.name,
        age: req.age,
        dob: req.dob,
        address: req.address,
        phone_number: req.phone_number,
        email: req.email,
        username: req.username,
        password_hash,
    };

    let user = st
        .store
        .update(id, changes)
        .await?
        .ok_or_else(AppError::user_not_found)?;
    info!(user_id = id, "user updated");
    Ok(user)
}

pub async fn delete_user(st: &AppState, id: i64) -> Result<(), AppError> {
    if !st.store.delete(id).await? {
        return Err(AppError::user_not_found());
    }
    info!(user_id = id, "user deleted");
    Ok(())
}
