use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{TraineeRepository, TrainerRepository, TrainingRepository, UserRepository};
use crate::errors::GymError;
use crate::models::{
    NewTrainee, NewTrainer, NewTraining, NewUser, Participant, Role, Trainee, TraineePatch,
    Trainer, TrainerPatch, Training, TrainingFilter, TrainingType, User,
};

struct TraineeRow {
    id: Uuid,
    date_of_birth: Option<NaiveDate>,
    address: Option<String>,
}

struct TrainerRow {
    id: Uuid,
    specialization: TrainingType,
}

struct TrainingRow {
    id: Uuid,
    trainee: String,
    trainer: String,
    name: String,
    training_type: TrainingType,
    training_date: NaiveDate,
    duration_minutes: i32,
    created_at: DateTime<Utc>,
}

/// Rows keyed by username; usernames never change.
#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    trainees: HashMap<String, TraineeRow>,
    trainers: HashMap<String, TrainerRow>,
    /// (trainee, trainer)
    links: BTreeSet<(String, String)>,
    trainings: Vec<TrainingRow>,
}

fn check_participant(role: &str, username: &str, active: Option<bool>) -> Result<(), GymError> {
    match active {
        Some(true) => Ok(()),
        Some(false) => Err(GymError::InvalidParticipant(format!(
            "{} '{}' is not active",
            role, username
        ))),
        None => Err(GymError::InvalidParticipant(format!(
            "{} '{}' does not exist",
            role, username
        ))),
    }
}

impl Tables {
    fn insert_user(&mut self, new_user: NewUser) -> Result<User, GymError> {
        if self.users.contains_key(&new_user.username) {
            return Err(GymError::ConflictRetry);
        }
        let user = new_user.into_user();
        self.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    fn trainee(&self, username: &str) -> Option<Trainee> {
        let row = self.trainees.get(username)?;
        let user = self.users.get(username)?;
        Some(Trainee {
            id: row.id,
            user: user.clone(),
            date_of_birth: row.date_of_birth,
            address: row.address.clone(),
        })
    }

    fn trainer(&self, username: &str) -> Option<Trainer> {
        let row = self.trainers.get(username)?;
        let user = self.users.get(username)?;
        Some(Trainer {
            id: row.id,
            user: user.clone(),
            specialization: row.specialization,
        })
    }

    fn trainee_active(&self, username: &str) -> Option<bool> {
        self.trainees.get(username)?;
        self.users.get(username).map(|user| user.is_active)
    }

    fn trainer_active(&self, username: &str) -> Option<bool> {
        self.trainers.get(username)?;
        self.users.get(username).map(|user| user.is_active)
    }

    fn participant(&self, username: &str) -> Option<Participant> {
        self.users.get(username).map(|user| Participant {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        })
    }

    fn training(&self, row: &TrainingRow) -> Option<Training> {
        Some(Training {
            id: row.id,
            name: row.name.clone(),
            training_type: row.training_type,
            training_date: row.training_date,
            duration_minutes: row.duration_minutes,
            trainee: self.participant(&row.trainee)?,
            trainer: self.participant(&row.trainer)?,
            created_at: row.created_at,
        })
    }

    fn update_names(
        &mut self,
        username: &str,
        role: Role,
        first_name: Option<&String>,
        last_name: Option<&String>,
        is_active: Option<bool>,
    ) -> Result<(), GymError> {
        let user = self
            .users
            .get_mut(username)
            .filter(|user| user.role == role)
            .ok_or_else(|| GymError::not_found(format!("{:?} '{}'", role, username)))?;

        if let Some(first_name) = first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = last_name {
            user.last_name = last_name.clone();
        }
        if let Some(is_active) = is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    fn sorted_trainings(&self, rows: Vec<&TrainingRow>) -> Vec<Training> {
        let mut trainings: Vec<Training> = rows.into_iter().filter_map(|row| self.training(row)).collect();
        trainings.sort_by(|a, b| {
            a.training_date
                .cmp(&b.training_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        trainings
    }
}

/// Process-local store with the same contract as [`super::PgStore`].
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>, GymError> {
        Ok(self.tables.read().await.users.get(username).cloned())
    }

    async fn usernames_with_base(&self, base: &str) -> Result<Vec<String>, GymError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .keys()
            .filter(|username| username.starts_with(base))
            .cloned()
            .collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, GymError> {
        self.tables.write().await.insert_user(user)
    }

    async fn update_password(&self, username: &str, password_hash: &str) -> Result<(), GymError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(username)
            .ok_or_else(|| GymError::not_found(format!("User '{}'", username)))?;
        user.password_hash = password_hash.to_string();
        user.credential_version += 1;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_active(&self, username: &str, is_active: bool) -> Result<User, GymError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(username)
            .ok_or_else(|| GymError::not_found(format!("User '{}'", username)))?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl TraineeRepository for InMemoryStore {
    async fn create_trainee(&self, user: NewUser, trainee: NewTrainee) -> Result<Trainee, GymError> {
        let mut tables = self.tables.write().await;
        let user = tables.insert_user(user)?;
        let row = TraineeRow {
            id: Uuid::new_v4(),
            date_of_birth: trainee.date_of_birth,
            address: trainee.address,
        };
        let trainee = Trainee {
            id: row.id,
            user,
            date_of_birth: row.date_of_birth,
            address: row.address.clone(),
        };
        tables.trainees.insert(trainee.user.username.clone(), row);
        Ok(trainee)
    }

    async fn find_trainee(&self, username: &str) -> Result<Option<Trainee>, GymError> {
        Ok(self.tables.read().await.trainee(username))
    }

    async fn update_trainee(&self, username: &str, patch: &TraineePatch) -> Result<Trainee, GymError> {
        let mut tables = self.tables.write().await;
        if !tables.trainees.contains_key(username) {
            return Err(GymError::not_found(format!("Trainee '{}'", username)));
        }

        tables.update_names(
            username,
            Role::Trainee,
            patch.first_name.as_ref(),
            patch.last_name.as_ref(),
            patch.is_active,
        )?;

        if let Some(row) = tables.trainees.get_mut(username) {
            if let Some(date_of_birth) = patch.date_of_birth {
                row.date_of_birth = Some(date_of_birth);
            }
            if let Some(address) = &patch.address {
                row.address = Some(address.clone());
            }
        }

        tables
            .trainee(username)
            .ok_or_else(|| GymError::not_found(format!("Trainee '{}'", username)))
    }

    async fn delete_trainee(&self, username: &str) -> Result<(), GymError> {
        let mut tables = self.tables.write().await;
        if tables.trainees.remove(username).is_none() {
            return Err(GymError::not_found(format!("Trainee '{}'", username)));
        }
        tables.users.remove(username);
        tables.links.retain(|(trainee, _)| trainee != username);
        tables.trainings.retain(|row| row.trainee != username);
        Ok(())
    }

    async fn trainers_of(&self, trainee_username: &str) -> Result<Vec<Trainer>, GymError> {
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .iter()
            .filter(|(trainee, _)| trainee == trainee_username)
            .filter_map(|(_, trainer)| tables.trainer(trainer))
            .collect())
    }

    async fn unassigned_trainers(&self, trainee_username: &str) -> Result<Vec<Trainer>, GymError> {
        let tables = self.tables.read().await;
        let mut trainers: Vec<Trainer> = tables
            .trainers
            .keys()
            .filter(|trainer| {
                !tables
                    .links
                    .contains(&(trainee_username.to_string(), (*trainer).clone()))
            })
            .filter_map(|trainer| tables.trainer(trainer))
            .filter(|trainer| trainer.user.is_active)
            .collect();
        trainers.sort_by(|a, b| a.user.username.cmp(&b.user.username));
        Ok(trainers)
    }

    async fn replace_trainers(
        &self,
        trainee_username: &str,
        trainer_usernames: &[String],
    ) -> Result<Vec<Trainer>, GymError> {
        let mut tables = self.tables.write().await;
        if !tables.trainees.contains_key(trainee_username) {
            return Err(GymError::not_found(format!("Trainee '{}'", trainee_username)));
        }
        for trainer in trainer_usernames {
            match tables.trainer_active(trainer) {
                Some(true) => {}
                Some(false) => {
                    return Err(GymError::InvalidParticipant(format!(
                        "trainer '{}' is not active",
                        trainer
                    )))
                }
                None => return Err(GymError::not_found(format!("Trainer '{}'", trainer))),
            }
        }

        tables.links.retain(|(trainee, _)| trainee != trainee_username);
        for trainer in trainer_usernames {
            tables
                .links
                .insert((trainee_username.to_string(), trainer.clone()));
        }

        Ok(tables
            .links
            .iter()
            .filter(|(trainee, _)| trainee == trainee_username)
            .filter_map(|(_, trainer)| tables.trainer(trainer))
            .collect())
    }
}

#[async_trait]
impl TrainerRepository for InMemoryStore {
    async fn create_trainer(&self, user: NewUser, trainer: NewTrainer) -> Result<Trainer, GymError> {
        let mut tables = self.tables.write().await;
        let user = tables.insert_user(user)?;
        let row = TrainerRow {
            id: Uuid::new_v4(),
            specialization: trainer.specialization,
        };
        let trainer = Trainer {
            id: row.id,
            user,
            specialization: row.specialization,
        };
        tables.trainers.insert(trainer.user.username.clone(), row);
        Ok(trainer)
    }

    async fn find_trainer(&self, username: &str) -> Result<Option<Trainer>, GymError> {
        Ok(self.tables.read().await.trainer(username))
    }

    async fn update_trainer(&self, username: &str, patch: &TrainerPatch) -> Result<Trainer, GymError> {
        let mut tables = self.tables.write().await;
        if !tables.trainers.contains_key(username) {
            return Err(GymError::not_found(format!("Trainer '{}'", username)));
        }

        tables.update_names(
            username,
            Role::Trainer,
            patch.first_name.as_ref(),
            patch.last_name.as_ref(),
            patch.is_active,
        )?;

        tables
            .trainer(username)
            .ok_or_else(|| GymError::not_found(format!("Trainer '{}'", username)))
    }

    async fn trainees_of(&self, trainer_username: &str) -> Result<Vec<Trainee>, GymError> {
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .iter()
            .filter(|(_, trainer)| trainer == trainer_username)
            .filter_map(|(trainee, _)| tables.trainee(trainee))
            .collect())
    }
}

#[async_trait]
impl TrainingRepository for InMemoryStore {
    async fn insert_training(&self, training: NewTraining) -> Result<Training, GymError> {
        let mut tables = self.tables.write().await;
        check_participant(
            "trainee",
            &training.trainee_username,
            tables.trainee_active(&training.trainee_username),
        )?;
        check_participant(
            "trainer",
            &training.trainer_username,
            tables.trainer_active(&training.trainer_username),
        )?;

        let row = TrainingRow {
            id: Uuid::new_v4(),
            trainee: training.trainee_username,
            trainer: training.trainer_username,
            name: training.name,
            training_type: training.training_type,
            training_date: training.training_date,
            duration_minutes: training.duration_minutes,
            created_at: Utc::now(),
        };

        tables
            .links
            .insert((row.trainee.clone(), row.trainer.clone()));
        let stored = tables
            .training(&row)
            .ok_or_else(|| GymError::InvalidParticipant("participant vanished".into()))?;
        tables.trainings.push(row);
        Ok(stored)
    }

    async fn trainee_trainings(
        &self,
        username: &str,
        filter: &TrainingFilter,
    ) -> Result<Vec<Training>, GymError> {
        let tables = self.tables.read().await;
        let rows = tables.trainings.iter().filter(|row| row.trainee == username).collect();
        Ok(tables
            .sorted_trainings(rows)
            .into_iter()
            .filter(|training| filter.matches(training, &training.trainer))
            .collect())
    }

    async fn trainer_trainings(
        &self,
        username: &str,
        filter: &TrainingFilter,
    ) -> Result<Vec<Training>, GymError> {
        let tables = self.tables.read().await;
        let rows = tables.trainings.iter().filter(|row| row.trainer == username).collect();
        Ok(tables
            .sorted_trainings(rows)
            .into_iter()
            .filter(|training| filter.matches(training, &training.trainee))
            .collect())
    }
}
