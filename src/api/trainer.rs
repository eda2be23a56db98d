use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, patch, post},
    Extension, Router,
};

use super::trainee::activation_message;
use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::GymError;
use crate::models::{
    ActivationRequest, MessageResponse, RegistrationResponse, TrainerPatch, TrainerProfile,
    TrainerRegisterRequest, TrainerTrainingsQuery, Training,
};
use crate::services::TrainerService;

/// Trainer routes
pub fn trainer_routes(trainers: TrainerService, auth_service: AuthService) -> Router {
    let protected = Router::new()
        .route("/:username", get(get_profile).put(update_profile))
        .route("/:username/active", patch(set_active))
        .route("/:username/trainings", get(list_trainings))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/register", post(register))
        .merge(protected)
        .with_state(trainers)
}

#[tracing::instrument(skip(trainers, request))]
async fn register(
    State(trainers): State<TrainerService>,
    Json(request): Json<TrainerRegisterRequest>,
) -> Result<(StatusCode, Json<RegistrationResponse>), GymError> {
    let response = trainers.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[tracing::instrument(skip(trainers, _caller))]
async fn get_profile(
    State(trainers): State<TrainerService>,
    Extension(_caller): Extension<UserSession>,
    Path(username): Path<String>,
) -> Result<Json<TrainerProfile>, GymError> {
    Ok(Json(trainers.profile(&username).await?))
}

#[tracing::instrument(skip(trainers, caller, patch))]
async fn update_profile(
    State(trainers): State<TrainerService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
    Json(patch): Json<TrainerPatch>,
) -> Result<Json<TrainerProfile>, GymError> {
    Ok(Json(trainers.update_profile(&username, &caller, patch).await?))
}

#[tracing::instrument(skip(trainers, caller, request))]
async fn set_active(
    State(trainers): State<TrainerService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
    Json(request): Json<ActivationRequest>,
) -> Result<Json<MessageResponse>, GymError> {
    trainers
        .set_active(&username, &caller, request.is_active)
        .await?;
    Ok(Json(MessageResponse {
        message: activation_message(&username, request.is_active),
    }))
}

#[tracing::instrument(skip(trainers, caller, query))]
async fn list_trainings(
    State(trainers): State<TrainerService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
    Query(query): Query<TrainerTrainingsQuery>,
) -> Result<Json<Vec<Training>>, GymError> {
    let trainings = trainers
        .trainings(&username, &caller, query.into())
        .await?;
    Ok(Json(trainings))
}
