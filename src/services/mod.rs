// Business logic services

pub mod trainee_service;
pub mod trainer_service;
pub mod training_service;
pub mod user_service;
pub mod username;

pub use trainee_service::TraineeService;
pub use trainer_service::TrainerService;
pub use training_service::TrainingService;
pub use user_service::UserService;

use crate::errors::GymError;

const MAX_NAME_LEN: usize = 100;

/// Trimmed, non-empty person name. Dots would make generated usernames ambiguous.
pub(crate) fn normalize_name(field: &str, value: &str) -> Result<String, GymError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(GymError::Validation(format!("{} must not be blank", field)));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(GymError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    if value.contains('.') {
        return Err(GymError::Validation(format!("{} must not contain '.'", field)));
    }

    Ok(value.to_string())
}

/// Applies [`normalize_name`] to an optional patch field.
pub(crate) fn normalize_optional_name(
    field: &str,
    value: Option<&str>,
) -> Result<Option<String>, GymError> {
    value.map(|value| normalize_name(field, value)).transpose()
}
