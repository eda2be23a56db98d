use anyhow::Result;

use crate::auth::PasswordHasher;
use crate::models::{NewUser, Role};
use crate::repository::Store;

/// Create the administrator account unless it already exists.
///
/// Without a configured password nothing is created; an existing account is
/// never modified.
pub async fn ensure_admin(
    store: &dyn Store,
    hasher: &PasswordHasher,
    username: &str,
    password: Option<&str>,
) -> Result<()> {
    if store.find_user(username).await?.is_some() {
        tracing::debug!(username, "admin account present");
        return Ok(());
    }

    let Some(password) = password else {
        tracing::warn!(username, "ADMIN_PASSWORD not set, skipping admin bootstrap");
        return Ok(());
    };

    store
        .create_user(NewUser {
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            username: username.to_string(),
            password_hash: hasher.hash(password)?,
            role: Role::Admin,
        })
        .await?;

    tracing::info!(username, "created admin account");
    Ok(())
}
