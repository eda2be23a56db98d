use axum::{routing::get, Router};
use chrono::Duration;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::health::health_check;
use super::trainee::trainee_routes;
use super::trainer::trainer_routes;
use super::training::training_routes;
use super::user::user_routes;
use crate::auth::{cors_layer, security_headers_layer, AuthService, PasswordHasher};
use crate::repository::Store;
use crate::services::{TraineeService, TrainerService, TrainingService, UserService};

/// Services shared by all handlers, wired to one store.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub trainees: TraineeService,
    pub trainers: TrainerService,
    pub trainings: TrainingService,
    pub users: UserService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        jwt_secret: &str,
        token_ttl: Duration,
        hasher: PasswordHasher,
    ) -> Self {
        let auth = AuthService::new(store.clone(), jwt_secret, token_ttl, hasher);

        Self {
            trainees: TraineeService::new(store.clone(), hasher),
            trainers: TrainerService::new(store.clone(), hasher),
            trainings: TrainingService::new(store.clone()),
            users: UserService::new(auth.clone(), store),
            auth,
        }
    }
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1/user", user_routes(state.users, state.auth.clone()))
        .nest("/api/v1/trainee", trainee_routes(state.trainees, state.auth.clone()))
        .nest("/api/v1/trainer", trainer_routes(state.trainers, state.auth.clone()))
        .nest("/api/v1/training", training_routes(state.trainings, state.auth))
        .layer(security_headers_layer())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
