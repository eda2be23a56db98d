use axum::{
    extract::{Path, State},
    middleware,
    response::Json,
    routing::{patch, post, put},
    Extension, Router,
};

use super::trainee::activation_message;
use crate::auth::{jwt_auth_middleware, AuthResponse, AuthService, LoginRequest, UserSession};
use crate::errors::GymError;
use crate::models::{ActivationRequest, ChangePasswordRequest, MessageResponse};
use crate::services::UserService;

/// Account routes. Login and password change authenticate with the body.
pub fn user_routes(users: UserService, auth_service: AuthService) -> Router {
    let protected = Router::new()
        .route("/on-off/:username", patch(set_active))
        .route_layer(middleware::from_fn_with_state(
            auth_service,
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/login", post(login))
        .route("/change-password", put(change_password))
        .merge(protected)
        .with_state(users)
}

/// Login user
#[tracing::instrument(skip(users, request))]
async fn login(
    State(users): State<UserService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, GymError> {
    Ok(Json(users.login(request).await?))
}

/// Change user password
#[tracing::instrument(skip(users, request))]
async fn change_password(
    State(users): State<UserService>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, GymError> {
    users.change_password(request).await?;
    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

#[tracing::instrument(skip(users, caller, request))]
async fn set_active(
    State(users): State<UserService>,
    Extension(caller): Extension<UserSession>,
    Path(username): Path<String>,
    Json(request): Json<ActivationRequest>,
) -> Result<Json<MessageResponse>, GymError> {
    users.set_active(&username, &caller, request.is_active).await?;
    Ok(Json(MessageResponse {
        message: activation_message(&username, request.is_active),
    }))
}
