use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trainee::TraineeSummary;
use super::training::TrainingType;
use super::user::User;

#[derive(Debug, Clone)]
pub struct Trainer {
    pub id: Uuid,
    pub user: User,
    pub specialization: TrainingType,
}

#[derive(Debug, Clone)]
pub struct NewTrainer {
    pub specialization: TrainingType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainerRegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub specialization: TrainingType,
}

/// Partial update. `specialization` is locked and only accepted when unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub specialization: Option<TrainingType>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainerSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub specialization: TrainingType,
}

impl From<&Trainer> for TrainerSummary {
    fn from(trainer: &Trainer) -> Self {
        Self {
            username: trainer.user.username.clone(),
            first_name: trainer.user.first_name.clone(),
            last_name: trainer.user.last_name.clone(),
            specialization: trainer.specialization,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainerProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub specialization: TrainingType,
    pub is_active: bool,
    pub trainees: Vec<TraineeSummary>,
}

impl TrainerProfile {
    pub fn new(trainer: Trainer, trainees: Vec<TraineeSummary>) -> Self {
        Self {
            username: trainer.user.username,
            first_name: trainer.user.first_name,
            last_name: trainer.user.last_name,
            specialization: trainer.specialization,
            is_active: trainer.user.is_active,
            trainees,
        }
    }
}
