use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgConnection, PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use super::{TraineeRepository, TrainerRepository, TrainingRepository, UserRepository};
use crate::errors::GymError;
use crate::models::{
    NewTrainee, NewTrainer, NewTraining, NewUser, Participant, Trainee, TraineePatch, Trainer,
    TrainerPatch, Training, TrainingFilter, User,
};

const USER_COLUMNS: &str = "u.id, u.first_name, u.last_name, u.username, u.password_hash, \
                            u.role, u.is_active, u.credential_version, u.created_at, u.updated_at";

const TRAINING_SELECT: &str = "SELECT t.id, t.name, t.training_type, t.training_date, \
     t.duration_minutes, t.created_at, \
     teu.username AS trainee_username, teu.first_name AS trainee_first_name, \
     teu.last_name AS trainee_last_name, \
     tru.username AS trainer_username, tru.first_name AS trainer_first_name, \
     tru.last_name AS trainer_last_name \
     FROM trainings t \
     JOIN trainees te ON te.id = t.trainee_id \
     JOIN users teu ON teu.id = te.user_id \
     JOIN trainers tr ON tr.id = t.trainer_id \
     JOIN users tru ON tru.id = tr.user_id";

/// Postgres-backed store. Multi-statement operations run in one transaction.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn filtered_trainings(
        &self,
        owner: &str,
        partner: &str,
        username: &str,
        filter: &TrainingFilter,
    ) -> Result<Vec<Training>, GymError> {
        let sql = format!(
            "{TRAINING_SELECT} \
             WHERE {owner}.username = $1 \
             AND ($2::date IS NULL OR t.training_date >= $2) \
             AND ($3::date IS NULL OR t.training_date <= $3) \
             AND ($4::text IS NULL \
                  OR lower({partner}.username) = lower($4) \
                  OR lower({partner}.first_name) = lower($4) \
                  OR lower({partner}.first_name || ' ' || {partner}.last_name) = lower($4)) \
             AND ($5::text IS NULL OR t.training_type = $5) \
             ORDER BY t.training_date ASC, t.created_at ASC"
        );

        let rows = sqlx::query(&sql)
            .bind(username)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.partner.as_deref().map(str::trim))
            .bind(filter.training_type.map(|t| t.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(training_from_row).collect()
    }
}

fn parse_column<T>(column: &str, value: String) -> Result<T, GymError>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|err: String| GymError::Internal(anyhow::anyhow!("column {}: {}", column, err)))
}

fn user_from_row(row: &PgRow) -> Result<User, GymError> {
    Ok(User {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: parse_column("role", row.try_get("role")?)?,
        is_active: row.try_get("is_active")?,
        credential_version: row.try_get("credential_version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn trainee_from_row(row: &PgRow) -> Result<Trainee, GymError> {
    Ok(Trainee {
        id: row.try_get("trainee_id")?,
        user: user_from_row(row)?,
        date_of_birth: row.try_get("date_of_birth")?,
        address: row.try_get("address")?,
    })
}

fn trainer_from_row(row: &PgRow) -> Result<Trainer, GymError> {
    Ok(Trainer {
        id: row.try_get("trainer_id")?,
        user: user_from_row(row)?,
        specialization: parse_column("specialization", row.try_get("specialization")?)?,
    })
}

fn training_from_row(row: &PgRow) -> Result<Training, GymError> {
    Ok(Training {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        training_type: parse_column("training_type", row.try_get("training_type")?)?,
        training_date: row.try_get("training_date")?,
        duration_minutes: row.try_get("duration_minutes")?,
        trainee: Participant {
            username: row.try_get("trainee_username")?,
            first_name: row.try_get("trainee_first_name")?,
            last_name: row.try_get("trainee_last_name")?,
        },
        trainer: Participant {
            username: row.try_get("trainer_username")?,
            first_name: row.try_get("trainer_first_name")?,
            last_name: row.try_get("trainer_last_name")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

/// Unique violations on insert mean a concurrent registration won the username.
fn insert_error(err: sqlx::Error) -> GymError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return GymError::ConflictRetry;
        }
    }
    GymError::Database(err)
}

async fn insert_user(conn: &mut PgConnection, new_user: NewUser) -> Result<User, GymError> {
    let user = new_user.into_user();

    sqlx::query(
        "INSERT INTO users (id, first_name, last_name, username, password_hash, role, is_active, credential_version, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(user.id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.is_active)
    .bind(user.credential_version)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(insert_error)?;

    Ok(user)
}

async fn fetch_trainee(conn: &mut PgConnection, username: &str) -> Result<Option<Trainee>, GymError> {
    let sql = format!(
        "SELECT {USER_COLUMNS}, te.id AS trainee_id, te.date_of_birth, te.address
         FROM trainees te JOIN users u ON u.id = te.user_id
         WHERE u.username = $1"
    );
    let row = sqlx::query(&sql).bind(username).fetch_optional(&mut *conn).await?;
    row.as_ref().map(trainee_from_row).transpose()
}

async fn fetch_trainer(conn: &mut PgConnection, username: &str) -> Result<Option<Trainer>, GymError> {
    let sql = format!(
        "SELECT {USER_COLUMNS}, tr.id AS trainer_id, tr.specialization
         FROM trainers tr JOIN users u ON u.id = tr.user_id
         WHERE u.username = $1"
    );
    let row = sqlx::query(&sql).bind(username).fetch_optional(&mut *conn).await?;
    row.as_ref().map(trainer_from_row).transpose()
}

async fn fetch_trainers_of(conn: &mut PgConnection, trainee_username: &str) -> Result<Vec<Trainer>, GymError> {
    let sql = format!(
        "SELECT {USER_COLUMNS}, tr.id AS trainer_id, tr.specialization
         FROM trainee_trainers tt
         JOIN trainees te ON te.id = tt.trainee_id
         JOIN users tu ON tu.id = te.user_id
         JOIN trainers tr ON tr.id = tt.trainer_id
         JOIN users u ON u.id = tr.user_id
         WHERE tu.username = $1
         ORDER BY u.username"
    );
    let rows = sqlx::query(&sql).bind(trainee_username).fetch_all(&mut *conn).await?;
    rows.iter().map(trainer_from_row).collect()
}

/// Participant id and activity. Locks the participant and its user row
/// so deletes and activation changes wait for the caller's transaction.
async fn participant(
    conn: &mut PgConnection,
    table: &str,
    username: &str,
) -> Result<Option<(Uuid, bool)>, GymError> {
    let sql = format!(
        "SELECT p.id, u.is_active FROM {table} p JOIN users u ON u.id = p.user_id
         WHERE u.username = $1 FOR SHARE OF p, u"
    );
    Ok(sqlx::query_as(&sql)
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Resolve a training participant, rejecting missing and deactivated accounts.
async fn active_participant(
    conn: &mut PgConnection,
    table: &str,
    role: &str,
    username: &str,
) -> Result<Uuid, GymError> {
    match participant(conn, table, username).await? {
        Some((id, true)) => Ok(id),
        Some((_, false)) => Err(GymError::InvalidParticipant(format!(
            "{} '{}' is not active",
            role, username
        ))),
        None => Err(GymError::InvalidParticipant(format!(
            "{} '{}' does not exist",
            role, username
        ))),
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, username: &str) -> Result<Option<User>, GymError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = $1");
        let row = sqlx::query(&sql).bind(username).fetch_optional(&self.pool).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn usernames_with_base(&self, base: &str) -> Result<Vec<String>, GymError> {
        Ok(sqlx::query_scalar("SELECT username FROM users WHERE left(username, length($1)) = $1")
            .bind(base)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, GymError> {
        let mut conn = self.pool.acquire().await?;
        insert_user(&mut conn, user).await
    }

    async fn update_password(&self, username: &str, password_hash: &str) -> Result<(), GymError> {
        let result = sqlx::query(
            "UPDATE users
             SET password_hash = $2, credential_version = credential_version + 1, updated_at = NOW()
             WHERE username = $1",
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(GymError::not_found(format!("User '{}'", username)));
        }
        Ok(())
    }

    async fn set_active(&self, username: &str, is_active: bool) -> Result<User, GymError> {
        let sql = format!(
            "UPDATE users u SET is_active = $2, updated_at = NOW()
             WHERE u.username = $1
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(username)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| GymError::not_found(format!("User '{}'", username)))?;
        user_from_row(&row)
    }
}

#[async_trait]
impl TraineeRepository for PgStore {
    async fn create_trainee(&self, user: NewUser, trainee: NewTrainee) -> Result<Trainee, GymError> {
        let mut tx = self.pool.begin().await?;
        let user = insert_user(&mut tx, user).await?;
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO trainees (id, user_id, date_of_birth, address) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(user.id)
            .bind(trainee.date_of_birth)
            .bind(trainee.address.as_deref())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Trainee {
            id,
            user,
            date_of_birth: trainee.date_of_birth,
            address: trainee.address,
        })
    }

    async fn find_trainee(&self, username: &str) -> Result<Option<Trainee>, GymError> {
        let mut conn = self.pool.acquire().await?;
        fetch_trainee(&mut conn, username).await
    }

    async fn update_trainee(&self, username: &str, patch: &TraineePatch) -> Result<Trainee, GymError> {
        let mut tx = self.pool.begin().await?;

        let user_id: Uuid = sqlx::query_scalar(
            "UPDATE users
             SET first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 is_active = COALESCE($4, is_active),
                 updated_at = NOW()
             WHERE username = $1 AND role = 'TRAINEE'
             RETURNING id",
        )
        .bind(username)
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(patch.is_active)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| GymError::not_found(format!("Trainee '{}'", username)))?;

        sqlx::query(
            "UPDATE trainees
             SET date_of_birth = COALESCE($2, date_of_birth),
                 address = COALESCE($3, address)
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(patch.date_of_birth)
        .bind(patch.address.as_deref())
        .execute(&mut *tx)
        .await?;

        let trainee = fetch_trainee(&mut tx, username)
            .await?
            .ok_or_else(|| GymError::not_found(format!("Trainee '{}'", username)))?;

        tx.commit().await?;
        Ok(trainee)
    }

    async fn delete_trainee(&self, username: &str) -> Result<(), GymError> {
        // Foreign keys cascade to trainees, trainee_trainers and trainings.
        let result = sqlx::query("DELETE FROM users WHERE username = $1 AND role = 'TRAINEE'")
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GymError::not_found(format!("Trainee '{}'", username)));
        }
        Ok(())
    }

    async fn trainers_of(&self, trainee_username: &str) -> Result<Vec<Trainer>, GymError> {
        let mut conn = self.pool.acquire().await?;
        fetch_trainers_of(&mut conn, trainee_username).await
    }

    async fn unassigned_trainers(&self, trainee_username: &str) -> Result<Vec<Trainer>, GymError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, tr.id AS trainer_id, tr.specialization
             FROM trainers tr JOIN users u ON u.id = tr.user_id
             WHERE u.is_active
               AND NOT EXISTS (
                   SELECT 1 FROM trainee_trainers tt
                   JOIN trainees te ON te.id = tt.trainee_id
                   JOIN users tu ON tu.id = te.user_id
                   WHERE tt.trainer_id = tr.id AND tu.username = $1)
             ORDER BY u.username"
        );
        let rows = sqlx::query(&sql)
            .bind(trainee_username)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(trainer_from_row).collect()
    }

    async fn replace_trainers(
        &self,
        trainee_username: &str,
        trainer_usernames: &[String],
    ) -> Result<Vec<Trainer>, GymError> {
        let mut tx = self.pool.begin().await?;

        let (trainee_id, _) = participant(&mut tx, "trainees", trainee_username)
            .await?
            .ok_or_else(|| GymError::not_found(format!("Trainee '{}'", trainee_username)))?;

        sqlx::query("DELETE FROM trainee_trainers WHERE trainee_id = $1")
            .bind(trainee_id)
            .execute(&mut *tx)
            .await?;

        for trainer_username in trainer_usernames {
            let trainer_id = match participant(&mut tx, "trainers", trainer_username).await? {
                Some((id, true)) => id,
                Some((_, false)) => {
                    return Err(GymError::InvalidParticipant(format!(
                        "trainer '{}' is not active",
                        trainer_username
                    )))
                }
                None => return Err(GymError::not_found(format!("Trainer '{}'", trainer_username))),
            };

            sqlx::query(
                "INSERT INTO trainee_trainers (trainee_id, trainer_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(trainee_id)
            .bind(trainer_id)
            .execute(&mut *tx)
            .await?;
        }

        let trainers = fetch_trainers_of(&mut tx, trainee_username).await?;
        tx.commit().await?;
        Ok(trainers)
    }
}

#[async_trait]
impl TrainerRepository for PgStore {
    async fn create_trainer(&self, user: NewUser, trainer: NewTrainer) -> Result<Trainer, GymError> {
        let mut tx = self.pool.begin().await?;
        let user = insert_user(&mut tx, user).await?;
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO trainers (id, user_id, specialization) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(user.id)
            .bind(trainer.specialization.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Trainer {
            id,
            user,
            specialization: trainer.specialization,
        })
    }

    async fn find_trainer(&self, username: &str) -> Result<Option<Trainer>, GymError> {
        let mut conn = self.pool.acquire().await?;
        fetch_trainer(&mut conn, username).await
    }

    async fn update_trainer(&self, username: &str, patch: &TrainerPatch) -> Result<Trainer, GymError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE users
             SET first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 is_active = COALESCE($4, is_active),
                 updated_at = NOW()
             WHERE username = $1 AND role = 'TRAINER'",
        )
        .bind(username)
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(patch.is_active)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(GymError::not_found(format!("Trainer '{}'", username)));
        }

        let trainer = fetch_trainer(&mut tx, username)
            .await?
            .ok_or_else(|| GymError::not_found(format!("Trainer '{}'", username)))?;

        tx.commit().await?;
        Ok(trainer)
    }

    async fn trainees_of(&self, trainer_username: &str) -> Result<Vec<Trainee>, GymError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, te.id AS trainee_id, te.date_of_birth, te.address
             FROM trainee_trainers tt
             JOIN trainers tr ON tr.id = tt.trainer_id
             JOIN users tru ON tru.id = tr.user_id
             JOIN trainees te ON te.id = tt.trainee_id
             JOIN users u ON u.id = te.user_id
             WHERE tru.username = $1
             ORDER BY u.username"
        );
        let rows = sqlx::query(&sql)
            .bind(trainer_username)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(trainee_from_row).collect()
    }
}

#[async_trait]
impl TrainingRepository for PgStore {
    async fn insert_training(&self, training: NewTraining) -> Result<Training, GymError> {
        let mut tx = self.pool.begin().await?;

        let trainee_id =
            active_participant(&mut tx, "trainees", "trainee", &training.trainee_username).await?;
        let trainer_id =
            active_participant(&mut tx, "trainers", "trainer", &training.trainer_username).await?;

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO trainings (id, trainee_id, trainer_id, name, training_type, training_date, duration_minutes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id)
        .bind(trainee_id)
        .bind(trainer_id)
        .bind(&training.name)
        .bind(training.training_type.as_str())
        .bind(training.training_date)
        .bind(training.duration_minutes)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO trainee_trainers (trainee_id, trainer_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(trainee_id)
        .bind(trainer_id)
        .execute(&mut *tx)
        .await?;

        let sql = format!("{TRAINING_SELECT} WHERE t.id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_one(&mut *tx).await?;
        let stored = training_from_row(&row)?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn trainee_trainings(
        &self,
        username: &str,
        filter: &TrainingFilter,
    ) -> Result<Vec<Training>, GymError> {
        self.filtered_trainings("teu", "tru", username, filter).await
    }

    async fn trainer_trainings(
        &self,
        username: &str,
        filter: &TrainingFilter,
    ) -> Result<Vec<Training>, GymError> {
        self.filtered_trainings("tru", "teu", username, filter).await
    }
}
