//! Persistence contract for the credential store and the gym entities.
//!
//! Each trait covers one entity type. Implementations run every method as a
//! single atomic unit and enforce username uniqueness: inserting a user whose
//! username is already taken fails with [`GymError::ConflictRetry`].

use async_trait::async_trait;

use crate::errors::GymError;
use crate::models::{
    NewTrainee, NewTrainer, NewTraining, NewUser, Trainee, TraineePatch, Trainer, TrainerPatch,
    Training, TrainingFilter, User,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<Option<User>, GymError>;

    /// Usernames equal to `base` or starting with it.
    async fn usernames_with_base(&self, base: &str) -> Result<Vec<String>, GymError>;

    /// Insert a standalone account (administrators).
    async fn create_user(&self, user: NewUser) -> Result<User, GymError>;

    async fn update_password(&self, username: &str, password_hash: &str) -> Result<(), GymError>;

    async fn set_active(&self, username: &str, is_active: bool) -> Result<User, GymError>;
}

#[async_trait]
pub trait TraineeRepository: Send + Sync {
    async fn create_trainee(&self, user: NewUser, trainee: NewTrainee) -> Result<Trainee, GymError>;

    async fn find_trainee(&self, username: &str) -> Result<Option<Trainee>, GymError>;

    async fn update_trainee(&self, username: &str, patch: &TraineePatch) -> Result<Trainee, GymError>;

    /// Removes the trainee, its user record, trainer links and trainings.
    async fn delete_trainee(&self, username: &str) -> Result<(), GymError>;

    async fn trainers_of(&self, trainee_username: &str) -> Result<Vec<Trainer>, GymError>;

    /// Active trainers not linked to the trainee, ordered by username.
    async fn unassigned_trainers(&self, trainee_username: &str) -> Result<Vec<Trainer>, GymError>;

    async fn replace_trainers(
        &self,
        trainee_username: &str,
        trainer_usernames: &[String],
    ) -> Result<Vec<Trainer>, GymError>;
}

#[async_trait]
pub trait TrainerRepository: Send + Sync {
    async fn create_trainer(&self, user: NewUser, trainer: NewTrainer) -> Result<Trainer, GymError>;

    async fn find_trainer(&self, username: &str) -> Result<Option<Trainer>, GymError>;

    /// Updates the user fields of the patch; specialization never changes.
    async fn update_trainer(&self, username: &str, patch: &TrainerPatch) -> Result<Trainer, GymError>;

    async fn trainees_of(&self, trainer_username: &str) -> Result<Vec<Trainee>, GymError>;
}

#[async_trait]
pub trait TrainingRepository: Send + Sync {
    /// Appends a training and links the pair if they were not linked yet.
    async fn insert_training(&self, training: NewTraining) -> Result<Training, GymError>;

    /// Trainings of a trainee ordered by date ascending; the filter partner is the trainer.
    async fn trainee_trainings(
        &self,
        username: &str,
        filter: &TrainingFilter,
    ) -> Result<Vec<Training>, GymError>;

    /// Trainings of a trainer ordered by date ascending; the filter partner is the trainee.
    async fn trainer_trainings(
        &self,
        username: &str,
        filter: &TrainingFilter,
    ) -> Result<Vec<Training>, GymError>;
}

/// Everything the services need from persistence.
pub trait Store: UserRepository + TraineeRepository + TrainerRepository + TrainingRepository {}

impl<T> Store for T where T: UserRepository + TraineeRepository + TrainerRepository + TrainingRepository {}
