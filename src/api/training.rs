use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};

use crate::auth::{jwt_auth_middleware, AuthService, UserSession};
use crate::errors::GymError;
use crate::models::{AddTrainingRequest, Training, TrainingTypeInfo};
use crate::services::TrainingService;

/// Training routes, all behind the bearer token check.
pub fn training_routes(trainings: TrainingService, auth_service: AuthService) -> Router {
    Router::new()
        .route("/", post(add_training))
        .route("/types", get(training_types))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ))
        .with_state(trainings)
}

#[tracing::instrument(skip(trainings, caller, request), fields(caller = %caller.username))]
async fn add_training(
    State(trainings): State<TrainingService>,
    Extension(caller): Extension<UserSession>,
    Json(request): Json<AddTrainingRequest>,
) -> Result<(StatusCode, Json<Training>), GymError> {
    let training = trainings.add_training(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(training)))
}

async fn training_types(State(trainings): State<TrainingService>) -> Json<Vec<TrainingTypeInfo>> {
    Json(trainings.training_types())
}
