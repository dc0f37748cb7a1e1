//! Account creation and removal

use crate::auth::{hash_password, Identity, UserRole};
use crate::error::{Error, Result};
use crate::records::validate::parse_username;
use crate::records::{NewUser, User};
use crate::store::Store;

/// The bootstrap account, which can never be deleted
pub const PROTECTED_USERNAME: &str = "admin";

/// Create an account with a freshly hashed password
pub async fn create_account(
    store: &dyn Store,
    username: &str,
    password: String,
    role: UserRole,
    bcrypt_cost: u32,
) -> Result<User> {
    let username = parse_username(username)?;
    if password.is_empty() {
        return Err(Error::Validation("password must not be empty".to_string()));
    }

    let password_hash =
        tokio::task::spawn_blocking(move || hash_password(&password, bcrypt_cost))
            .await
            .map_err(|e| Error::Internal(format!("password hashing task failed: {e}")))??;

    let user = store
        .create_user(NewUser {
            username,
            password_hash,
            role,
        })
        .await?;

    tracing::info!(user = %user.username, role = %user.role, "created account");
    Ok(user)
}

/// Delete `username` and everything they own, on behalf of `acting`.
///
/// The protected admin account and the caller's own account are refused
/// before the store is consulted.
pub async fn delete_account(store: &dyn Store, acting: &Identity, username: &str) -> Result<User> {
    if username == PROTECTED_USERNAME {
        return Err(Error::Validation(
            "The admin account cannot be deleted".to_string(),
        ));
    }
    if username == acting.username {
        return Err(Error::Validation("You cannot delete yourself".to_string()));
    }

    let user = store
        .find_user_by_username(username)
        .await?
        .map(|record| record.user)
        .ok_or(Error::UserNotFound)?;

    if user.id == acting.id {
        return Err(Error::Validation("You cannot delete yourself".to_string()));
    }

    if !store.delete_user_cascade(user.id).await? {
        return Err(Error::UserNotFound);
    }

    tracing::info!(user = %user.username, by = %acting.username, "deleted account");
    Ok(user)
}
