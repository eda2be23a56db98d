//! Login handle generation.
//!
//! A handle is `First.Last`, or `First.Last<n>` with the smallest free `n`
//! starting at 0 once the bare handle is taken. The store's unique constraint
//! decides races; [`register_with_retry`] regenerates on conflict.

use std::collections::HashSet;
use std::future::Future;

use crate::errors::GymError;
use crate::repository::Store;

/// Attempts before a registration gives up on conflicts.
pub const MAX_REGISTRATION_ATTEMPTS: usize = 10;

pub fn base_username(first_name: &str, last_name: &str) -> String {
    format!("{}.{}", first_name.trim(), last_name.trim())
}

/// Pick the bare base if free, otherwise the smallest free numeric suffix.
pub fn next_free_username<S: AsRef<str>>(base: &str, taken: &[S]) -> String {
    let taken: HashSet<&str> = taken.iter().map(AsRef::as_ref).collect();

    if !taken.contains(base) {
        return base.to_string();
    }

    (0u64..)
        .map(|suffix| format!("{}{}", base, suffix))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| base.to_string())
}

/// Generate a handle for the name and hand it to `insert`, regenerating when
/// the insert reports [`GymError::ConflictRetry`].
pub async fn register_with_retry<T, F, Fut>(
    store: &dyn Store,
    first_name: &str,
    last_name: &str,
    mut insert: F,
) -> Result<T, GymError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, GymError>>,
{
    let base = base_username(first_name, last_name);

    for attempt in 1..=MAX_REGISTRATION_ATTEMPTS {
        let taken = store.usernames_with_base(&base).await?;
        let candidate = next_free_username(&base, &taken);

        match insert(candidate.clone()).await {
            Err(GymError::ConflictRetry) => {
                tracing::warn!(username = %candidate, attempt, "username taken concurrently, retrying");
            }
            result => return result,
        }
    }

    Err(GymError::Internal(anyhow::anyhow!(
        "could not allocate a username for '{}' after {} attempts",
        base,
        MAX_REGISTRATION_ATTEMPTS
    )))
}
