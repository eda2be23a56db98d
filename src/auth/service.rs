use chrono::Duration;
use std::sync::Arc;

use crate::auth::{AuthResponse, JwtService, LoginRequest, PasswordHasher, UserSession};
use crate::errors::GymError;
use crate::models::{User, UserInfo};
use crate::repository::Store;

/// The credential gate: every login and password change passes through
/// [`AuthService::authenticate`], every protected request through
/// [`AuthService::validate_session`].
#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("jwt_service", &self.jwt_service)
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        jwt_secret: &str,
        token_ttl: Duration,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret, token_ttl),
            store,
            hasher,
        }
    }

    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    /// Check a username/password pair against the store.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller.
    /// Deactivated accounts still authenticate.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, GymError> {
        let Some(user) = self.store.find_user(username).await? else {
            tracing::debug!(username, "authentication failed: unknown user");
            return Err(GymError::AuthenticationFailure);
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            tracing::debug!(username, "authentication failed: wrong password");
            return Err(GymError::AuthenticationFailure);
        }

        Ok(user)
    }

    /// Login user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, GymError> {
        let user = self.authenticate(&request.username, &request.password).await?;
        let access_token = self
            .jwt_service
            .create_access_token(&user)?;

        tracing::info!(username = %user.username, role = %user.role, "user logged in");

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.access_token_expires_in_seconds(),
            user: UserInfo::from(&user),
        })
    }

    /// Resolve a bearer token to the caller as currently stored.
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, GymError> {
        let claims = self.jwt_service.validate_token(token)?;

        // Deleted accounts and changed passwords revoke unexpired tokens.
        // The id check stops a token from following a reissued username.
        let user = self
            .store
            .find_user(&claims.sub)
            .await?
            .filter(|user| user.id == claims.uid && user.credential_version == claims.ver)
            .ok_or_else(|| {
                tracing::debug!(username = %claims.sub, "token no longer matches stored account");
                GymError::AuthenticationFailure
            })?;

        Ok(UserSession::from(&user))
    }
}
