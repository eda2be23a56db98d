use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Read-only catalog of training types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrainingType {
    Agility,
    Cardio,
    Fitness,
    Resistance,
    Stretching,
    Yoga,
    Zumba,
}

impl TrainingType {
    pub const ALL: [TrainingType; 7] = [
        TrainingType::Agility,
        TrainingType::Cardio,
        TrainingType::Fitness,
        TrainingType::Resistance,
        TrainingType::Stretching,
        TrainingType::Yoga,
        TrainingType::Zumba,
    ];

    /// Stable catalog id.
    pub fn id(&self) -> i32 {
        match self {
            TrainingType::Agility => 1,
            TrainingType::Cardio => 2,
            TrainingType::Fitness => 3,
            TrainingType::Resistance => 4,
            TrainingType::Stretching => 5,
            TrainingType::Yoga => 6,
            TrainingType::Zumba => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingType::Agility => "AGILITY",
            TrainingType::Cardio => "CARDIO",
            TrainingType::Fitness => "FITNESS",
            TrainingType::Resistance => "RESISTANCE",
            TrainingType::Stretching => "STRETCHING",
            TrainingType::Yoga => "YOGA",
            TrainingType::Zumba => "ZUMBA",
        }
    }
}

impl fmt::Display for TrainingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        TrainingType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| format!("unknown training type '{}'", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingTypeInfo {
    pub id: i32,
    pub name: TrainingType,
}

impl From<TrainingType> for TrainingTypeInfo {
    fn from(training_type: TrainingType) -> Self {
        Self {
            id: training_type.id(),
            name: training_type,
        }
    }
}

/// Name fields of one side of a training session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl Participant {
    /// Case-insensitive match on username, first name or full name.
    /// Unicode lowercasing, same as SQL `lower()`.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.username.to_lowercase() == name
            || self.first_name.to_lowercase() == name
            || format!("{} {}", self.first_name, self.last_name).to_lowercase() == name
    }
}

/// Immutable record of one session between a trainee and a trainer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Training {
    pub id: Uuid,
    pub name: String,
    pub training_type: TrainingType,
    pub training_date: NaiveDate,
    pub duration_minutes: i32,
    pub trainee: Participant,
    pub trainer: Participant,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTraining {
    pub trainee_username: String,
    pub trainer_username: String,
    pub name: String,
    pub training_type: TrainingType,
    pub training_date: NaiveDate,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddTrainingRequest {
    pub trainee_username: String,
    pub trainer_username: String,
    pub name: String,
    pub training_type: TrainingType,
    pub training_date: NaiveDate,
    pub duration_minutes: i32,
}

impl From<AddTrainingRequest> for NewTraining {
    fn from(request: AddTrainingRequest) -> Self {
        Self {
            trainee_username: request.trainee_username,
            trainer_username: request.trainer_username,
            name: request.name.trim().to_string(),
            training_type: request.training_type,
            training_date: request.training_date,
            duration_minutes: request.duration_minutes,
        }
    }
}

/// Optional criteria applied to a training list; `partner` is the other side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub partner: Option<String>,
    pub training_type: Option<TrainingType>,
}

impl TrainingFilter {
    pub fn matches(&self, training: &Training, partner: &Participant) -> bool {
        if let Some(from) = self.from {
            if training.training_date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if training.training_date > to {
                return false;
            }
        }
        if let Some(name) = &self.partner {
            if !partner.matches_name(name) {
                return false;
            }
        }
        if let Some(training_type) = self.training_type {
            if training.training_type != training_type {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TraineeTrainingsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub trainer: Option<String>,
    pub training_type: Option<TrainingType>,
}

impl From<TraineeTrainingsQuery> for TrainingFilter {
    fn from(query: TraineeTrainingsQuery) -> Self {
        Self {
            from: query.from,
            to: query.to,
            partner: query.trainer,
            training_type: query.training_type,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TrainerTrainingsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub trainee: Option<String>,
}

impl From<TrainerTrainingsQuery> for TrainingFilter {
    fn from(query: TrainerTrainingsQuery) -> Self {
        Self {
            from: query.from,
            to: query.to,
            partner: query.trainee,
            training_type: None,
        }
    }
}
