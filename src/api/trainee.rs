use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch, post, put},
    Extension, Router,
};

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::GymError;
use crate::models::{
    ActivationRequest, AssignTrainersRequest, MessageResponse, RegistrationResponse,
    TraineePatch, TraineeProfile, TraineeRegisterRequest, TraineeTrainingsQuery, TrainerSummary,
    Training,
};
use crate::services::TraineeService;

/// Trainee routes. Registration is open, everything else needs a bearer token.
pub fn trainee_routes(trainees: TraineeService, auth_service: AuthService) -> Router {
    let protected = Router::new()
        .route(
            "/:username",
            get(get_profile).put(update_profile).delete(delete_trainee),
        )
        .route("/:username/active", patch(set_active))
        .route("/:username/trainings", get(list_trainings))
        .route("/:username/unassigned-trainers", get(unassigned_trainers))
        .route("/:username/trainers", put(assign_trainers))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/register", post(register))
        .merge(protected)
        .with_state(trainees)
}

#[tracing::instrument(skip(trainees, request))]
async fn register(
    State(trainees): State<TraineeService>,
    Json(request): Json<TraineeRegisterRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), GymError> {
    let response = trainees.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[tracing::instrument(skip(trainees, _caller))]
async fn get_profile(
    State(trainees): State<TraineeService>,
    Extension(_caller): Extension<UserSession>,
    Path(username): Path<String>,
) -> Result<Json<TraineeProfile>, GymError> {
    Ok(Json(trainees.profile(&username).await?))
}

#[tracing::instrument(skip(trainees, caller, patch))]
async fn update_profile(
    State(trainees): State<TraineeService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
    Json(patch): Json<TraineePatch>,
) -> Result<Json<TraineeProfile>, GymError> {
    Ok(Json(trainees.update_profile(&username, &caller, patch).await?))
}

#[tracing::instrument(skip(trainees, caller))]
async fn delete_trainee(
    State(trainees): State<TraineeService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, GymError> {
    trainees.delete(&username, &caller).await?;
    Ok(Json(MessageResponse {
        message: format!("Trainee '{}' deleted", username),
    }))
}

#[tracing::instrument(skip(trainees, caller, request))]
async fn set_active(
    State(trainees): State<TraineeService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
    Json(request): Json<ActivationRequest>,
) -> Result<Json<MessageResponse>, GymError> {
    trainees
        .set_active(&username, &caller, request.is_active)
        .await?;
    Ok(Json(MessageResponse {
        message: activation_message(&username, request.is_active),
    }))
}

#[tracing::instrument(skip(trainees, caller, query))]
async fn list_trainings(
    State(trainees): State<TraineeService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
    Query(query): Query<TraineeTrainingsQuery>,
) -> Result<Json<Vec<Training>>, GymError> {
    let trainings = trainees
        .trainings(&username, &caller, query.into())
        .await?;
    Ok(Json(trainings))
}

#[tracing::instrument(skip(trainees, caller))]
async fn unassigned_trainers(
    State(trainees): State<TraineeService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
) -> Result<Json<Vec<TrainerSummary>>, GymError> {
    Ok(Json(trainees.unassigned_trainers(&username, &caller).await?))
}

#[tracing::instrument(skip(trainees, caller, request))]
async fn assign_trainers(
    State(trainees): State<TraineeService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
    Json(request): Json<AssignTrainersRequest>,
) -> Result<Json<Vec<TrainerSummary>>, GymError> {
    let trainers = trainees
        .assign_trainers(&username, &caller, request.trainers)
        .await?;
    Ok(Json(trainers))
}

pub(crate) fn activation_message(username: &str, is_active: bool) -> String {
    if is_active {
        format!("'{}' is active", username)
    } else {
        format!("'{}' is inactive", username)
    }
}
