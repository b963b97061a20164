//! In-process `UserStore` for tests. Mirrors the table's identity column and
//! unique constraints so service and HTTP behavior can be exercised without Postgres.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::users::repo::{StoreError, UniqueField, UserStore};
use crate::users::repo_types::{NewUser, User, UserChanges};

#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    last_id: i64,
    rows: Vec<User>,
}

impl Inner {
    fn taken(&self, field: UniqueField, value: &str, except: Option<i64>) -> bool {
        self.rows
            .iter()
            .filter(|u| Some(u.id) != except)
            .any(|u| field_value(u, field) == value)
    }

    fn check_unique(
        &self,
        email: &str,
        phone_number: &str,
        username: &str,
        except: Option<i64>,
    ) -> Result<(), StoreError> {
        for (field, value) in [
            (UniqueField::Email, email),
            (UniqueField::PhoneNumber, phone_number),
            (UniqueField::Username, username),
        ] {
            if self.taken(field, value, except) {
                return Err(StoreError::Duplicate(field));
            }
        }
        Ok(())
    }
}

fn field_value(user: &User, field: UniqueField) -> &str {
    match field {
        UniqueField::Email => &user.email,
        UniqueField::PhoneNumber => &user.phone_number,
        UniqueField::Username => &user.username,
    }
}

/// Writes the present fields onto `user`, like the COALESCE update.
fn apply_changes(changes: UserChanges, user: &mut User) {
    if let Some(v) = changes.name {
        user.name = v;
    }
    if let Some(v) = changes.age {
        user.age = v;
    }
    if let Some(v) = changes.dob {
        user.dob = v;
    }
    if let Some(v) = changes.address {
        user.address = v;
    }
    if let Some(v) = changes.phone_number {
        user.phone_number = v;
    }
    if let Some(v) = changes.email {
        user.email = v;
    }
    if let Some(v) = changes.username {
        user.username = v;
    }
    if let Some(v) = changes.password_hash {
        user.password_hash = v;
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_unique(&self, field: UniqueField, value: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.iter().find(|u| field_value(u, field) == value).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_unique(&user.email, &user.phone_number, &user.username, None)?;
        inner.last_id += 1;
        let row = User {
            id: inner.last_id,
            name: user.name,
            age: user.age,
            dob: user.dob,
            address: user.address,
            phone_number: user.phone_number,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.lock().await.rows.clone())
    }

    async fn get(&self, id: i64) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(pos) = inner.rows.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        let mut updated = inner.rows[pos].clone();
        apply_changes(changes, &mut updated);
        inner.check_unique(&updated.email, &updated.phone_number, &updated.username, Some(id))?;
        inner.rows[pos] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.rows.len();
        inner.rows.retain(|u| u.id != id);
        Ok(inner.rows.len() != before)
    }
}
