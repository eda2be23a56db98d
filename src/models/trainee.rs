use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trainer::TrainerSummary;
use super::user::User;

#[derive(Debug, Clone)]
pub struct Trainee {
    pub id: Uuid,
    pub user: User,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTrainee {
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraineeRegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

/// Partial update; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraineePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraineeSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Trainee> for TraineeSummary {
    fn from(trainee: &Trainee) -> Self {
        Self {
            username: trainee.user.username.clone(),
            first_name: trainee.user.first_name.clone(),
            last_name: trainee.user.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraineeProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub is_active: bool,
    pub trainers: Vec<TrainerSummary>,
}

impl TraineeProfile {
    pub fn new(trainee: Trainee, trainers: Vec<TrainerSummary>) -> Self {
        Self {
            username: trainee.user.username,
            first_name: trainee.user.first_name,
            last_name: trainee.user.last_name,
            date_of_birth: trainee.date_of_birth,
            address: trainee.address,
            is_active: trainee.user.is_active,
            trainers,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignTrainersRequest {
    pub trainers: Vec<String>,
}
