use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::auth::{generate_password, PasswordHasher, UserSession};
use crate::errors::GymError;
use crate::models::{
    NewTrainee, NewUser, RegistrationResponse, Role, Trainee, TraineePatch, TraineeProfile,
    TraineeRegisterRequest, TrainerSummary, Training, TrainingFilter,
};
use crate::repository::Store;
use crate::services::username::register_with_retry;
use crate::services::{normalize_name, normalize_optional_name};

#[derive(Clone)]
pub struct TraineeService {
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
}

impl TraineeService {
    pub fn new(store: Arc<dyn Store>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Create a trainee account and disclose its generated credentials once.
    pub async fn register(
        &self,
        request: TraineeRegisterRequest,
    ) -> Result<RegistrationResponse, GymError> {
        let first_name = normalize_name("first_name", &request.first_name)?;
        let last_name = normalize_name("last_name", &request.last_name)?;
        let details = NewTrainee {
            date_of_birth: request.date_of_birth,
            address: clean_address(request.address),
        };
        validate_details(&details)?;

        let password = generate_password();
        let password_hash = self.hasher.hash(&password)?;

        let store = &self.store;
        let trainee = register_with_retry(store.as_ref(), &first_name, &last_name, |username| {
            let user = NewUser {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                username,
                password_hash: password_hash.clone(),
                role: Role::Trainee,
            };
            let details = details.clone();
            async move { store.create_trainee(user, details).await }
        })
        .await?;

        tracing::info!(username = %trainee.user.username, "registered trainee");

        Ok(RegistrationResponse {
            username: trainee.user.username,
            password,
        })
    }

    pub async fn profile(&self, username: &str) -> Result<TraineeProfile, GymError> {
        let trainee = self.find(username).await?;
        self.to_profile(trainee).await
    }

    /// Apply the present fields of `patch`; username and role never change.
    pub async fn update_profile(
        &self,
        username: &str,
        caller: &UserSession,
        patch: TraineePatch,
    ) -> Result<TraineeProfile, GymError> {
        caller.require_active()?;
        caller.require_owner_or_admin(username)?;

        let patch = TraineePatch {
            first_name: normalize_optional_name("first_name", patch.first_name.as_deref())?,
            last_name: normalize_optional_name("last_name", patch.last_name.as_deref())?,
            date_of_birth: patch.date_of_birth,
            address: clean_address(patch.address),
            is_active: patch.is_active,
        };
        validate_details(&NewTrainee {
            date_of_birth: patch.date_of_birth,
            address: None,
        })?;

        let trainee = self.store.update_trainee(username, &patch).await?;
        tracing::info!(username, by = %caller.username, "updated trainee profile");

        self.to_profile(trainee).await
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

        let trainee = self.find(username).await?;
        if trainee.user.is_active == is_active {
            tracing::debug!(username, is_active, "trainee already in requested state");
            return Ok(());
        }

        self.store.set_active(username, is_active).await?;
        tracing::info!(username, is_active, by = %caller.username, "trainee activation changed");
        Ok(())
    }

    pub async fn delete(&self, username: &str, caller: &UserSession) -> Result<(), GymError> {
        caller.require_active()?;
        caller.require_admin()?;

        self.store.delete_trainee(username).await?;
        tracing::info!(username, by = %caller.username, "deleted trainee");
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

        self.store.trainee_trainings(username, &filter).await
    }

    pub async fn unassigned_trainers(
        &self,
        username: &str,
        caller: &UserSession,
    ) -> Result<Vec<TrainerSummary>, GymError> {
        caller.require_owner_or_admin(username)?;
        self.find(username).await?;

        let trainers = self.store.unassigned_trainers(username).await?;
        Ok(trainers.iter().map(TrainerSummary::from).collect())
    }

    /// Replace the trainee's trainer list. Every trainer must exist and be active.
    pub async fn assign_trainers(
        &self,
        username: &str,
        caller: &UserSession,
        trainer_usernames: Vec<String>,
    ) -> Result<Vec<TrainerSummary>, GymError> {
        caller.require_active()?;
        caller.require_owner_or_admin(username)?;
        self.find(username).await?;

        let requested: Vec<String> = trainer_usernames
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let trainers = self.store.replace_trainers(username, &requested).await?;
        tracing::info!(username, count = trainers.len(), by = %caller.username, "assigned trainers");

        Ok(trainers.iter().map(TrainerSummary::from).collect())
    }

    async fn find(&self, username: &str) -> Result<Trainee, GymError> {
        self.store
            .find_trainee(username)
            .await?
            .ok_or_else(|| GymError::not_found(format!("Trainee '{}'", username)))
    }

    async fn to_profile(&self, trainee: Trainee) -> Result<TraineeProfile, GymError> {
        let trainers = self.store.trainers_of(&trainee.user.username).await?;
        let trainers = trainers.iter().map(TrainerSummary::from).collect();
        Ok(TraineeProfile::new(trainee, trainers))
    }
}

fn clean_address(address: Option<String>) -> Option<String> {
    address
        .map(|address| address.trim().to_string())
        .filter(|address| !address.is_empty())
}

fn validate_details(details: &NewTrainee) -> Result<(), GymError> {
    if let Some(date_of_birth) = details.date_of_birth {
        if date_of_birth > Utc::now().date_naive() {
            return Err(GymError::Validation(
                "date_of_birth must not be in the future".to_string(),
            ));
        }
    }
    Ok(())
}
