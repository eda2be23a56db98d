use std::sync::Arc;

use crate::auth::{generate_password, PasswordHasher, UserSession};
use crate::errors::GymError;
use crate::models::{
    NewTrainer, NewUser, RegistrationResponse, Role, Trainer, TrainerPatch, TrainerProfile,
    TrainerRegisterRequest, TraineeSummary, Training, TrainingFilter,
};
use crate::repository::Store;
use crate::services::username::register_with_retry;
use crate::services::{normalize_name, normalize_optional_name};

#[derive(Clone)]
pub struct TrainerService {
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
}

impl TrainerService {
    pub fn new(store: Arc<dyn Store>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    pub async fn register(
        &self,
        request: TrainerRegisterRequest,
    ) -> Result<RegistrationResponse, GymError> {
        let first_name = normalize_name("first_name", &request.first_name)?;
        let last_name = normalize_name("last_name", &request.last_name)?;
        let specialization = request.specialization;

        let password = generate_password();
        let password_hash = self.hasher.hash(&password)?;

        let store = &self.store;
        let trainer = register_with_retry(store.as_ref(), &first_name, &last_name, |username| {
            let user = NewUser {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                username,
                password_hash: password_hash.clone(),
                role: Role::Trainer,
            };
            async move {
                store
                    .create_trainer(user, NewTrainer { specialization })
                    .await
            }
        })
        .await?;

        tracing::info!(
            username = %trainer.user.username,
            specialization = %trainer.specialization,
            "registered trainer"
        );

        Ok(RegistrationResponse {
            username: trainer.user.username,
            password,
        })
    }

    pub async fn profile(&self, username: &str) -> Result<TrainerProfile, GymError> {
        let trainer = self.find(username).await?;
        self.to_profile(trainer).await
    }

    /// Specialization is fixed at registration; a patch may only repeat it.
    pub async fn update_profile(
        &self,
        username: &str,
        caller: &UserSession,
        patch: TrainerPatch,
    ) -> Result<TrainerProfile, GymError> {
        caller.require_active()?;
        caller.require_owner_or_admin(username)?;

        let current = self.find(username).await?;
        if let Some(specialization) = patch.specialization {
            if specialization != current.specialization {
                return Err(GymError::Validation(format!(
                    "specialization of '{}' is {} and cannot be changed",
                    username, current.specialization
                )));
            }
        }

        let patch = TrainerPatch {
            first_name: normalize_optional_name("first_name", patch.first_name.as_deref())?,
            last_name: normalize_optional_name("last_name", patch.last_name.as_deref())?,
            specialization: None,
            is_active: patch.is_active,
        };

        let trainer = self.store.update_trainer(username, &patch).await?;
        tracing::info!(username, by = %caller.username, "updated trainer profile");

        self.to_profile(trainer).await
    }

    /// Idempotent; setting the current state again succeeds unchanged.
    pub async fn set_active(
        &self,
        username: &str,
        caller: &UserSession,
        is_active: bool,
    ) -> Result<(), GymError> {
        caller.require_active()?;
        caller.require_owner_or_admin(username)?;

        let trainer = self.find(username).await?;
        if trainer.user.is_active == is_active {
            tracing::debug!(username, is_active, "trainer already in requested state");
            return Ok(());
        }

        self.store.set_active(username, is_active).await?;
        tracing::info!(username, is_active, by = %caller.username, "trainer activation changed");
        Ok(())
    }

    pub async fn trainings(
        &self,
        username: &str,
        caller: &UserSession,
        filter: TrainingFilter,
    ) -> Result<Vec<Training>, GymError> {
        caller.require_owner_or_admin(username)?;
        self.find(username).await?;

        // Trainer lists are never filtered by type.
        let filter = TrainingFilter {
            training_type: None,
            ..filter
        };
        self.store.trainer_trainings(username, &filter).await
    }

    async fn find(&self, username: &str) -> Result<Trainer, GymError> {
        self.store
            .find_trainer(username)
            .await?
            .ok_or_else(|| GymError::not_found(format!("Trainer '{}'", username)))
    }

    async fn to_profile(&self, trainer: Trainer) -> Result<TrainerProfile, GymError> {
        let trainees = self.store.trainees_of(&trainer.user.username).await?;
        let trainees = trainees.iter().map(TraineeSummary::from).collect();
        Ok(TrainerProfile::new(trainer, trainees))
    }
}
