use std::sync::Arc;

use crate::auth::UserSession;
use crate::errors::GymError;
use crate::models::{AddTrainingRequest, NewTraining, Training, TrainingType, TrainingTypeInfo};
use crate::repository::Store;

const MAX_DURATION_MINUTES: i32 = 24 * 60;

#[derive(Clone)]
pub struct TrainingService {
    store: Arc<dyn Store>,
}

impl TrainingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Record a session. Both participants must exist and be active; on any
    /// failure nothing is persisted.
    pub async fn add_training(
        &self,
        caller: &UserSession,
        request: AddTrainingRequest,
    ) -> Result<Training, GymError> {
        caller.require_active()?;

        let training = NewTraining::from(request);
        validate(&training)?;

        if !caller.is_admin()
            && !caller.is_owner(&training.trainee_username)
            && !caller.is_owner(&training.trainer_username)
        {
            return Err(GymError::access_denied(format!(
                "'{}' is not a participant of this training",
                caller.username
            )));
        }

        // Participants must exist and be active; the store checks under its write lock.
        let stored = self.store.insert_training(training).await?;
        tracing::info!(
            trainee = %stored.trainee.username,
            trainer = %stored.trainer.username,
            training_type = %stored.training_type,
            date = %stored.training_date,
            "training added"
        );

        Ok(stored)
    }

    /// The static training type catalog, ordered by id.
    pub fn training_types(&self) -> Vec<TrainingTypeInfo> {
        TrainingType::ALL.into_iter().map(TrainingTypeInfo::from).collect()
    }
}

fn validate(training: &NewTraining) -> Result<(), GymError> {
    if training.name.is_empty() {
        return Err(GymError::Validation("name must not be blank".to_string()));
    }
    if training.duration_minutes <= 0 || training.duration_minutes > MAX_DURATION_MINUTES {
        return Err(GymError::Validation(format!(
            "duration_minutes must be between 1 and {}",
            MAX_DURATION_MINUTES
        )));
    }
    Ok(())
}
