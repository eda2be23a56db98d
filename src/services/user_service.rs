use std::sync::Arc;

use crate::auth::{
    validate_password_strength, AuthResponse, AuthService, LoginRequest, PasswordHasher,
    PasswordPolicy, UserSession,
};
use crate::errors::GymError;
use crate::models::{ChangePasswordRequest, User, UserInfo};
use crate::repository::Store;

/// Account-level operations shared by every role.
#[derive(Clone)]
pub struct UserService {
    auth: AuthService,
    store: Arc<dyn Store>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
}

impl UserService {
    pub fn new(auth: AuthService, store: Arc<dyn Store>) -> Self {
        let hasher = auth.hasher();
        Self {
            auth,
            store,
            hasher,
            policy: PasswordPolicy::default(),
        }
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, GymError> {
        self.auth.authenticate(username, password).await
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, GymError> {
        self.auth.login(request).await
    }

    /// Holding the old password is the only credential needed.
    pub async fn change_password(&self, request: ChangePasswordRequest) -> Result<(), GymError> {
        let user = self
            .auth
            .authenticate(&request.username, &request.old_password)
            .await?;

        validate_password_strength(&request.new_password, &self.policy)?;

        let password_hash = self.hasher.hash(&request.new_password)?;
        self.store
            .update_password(&user.username, &password_hash)
            .await?;

        tracing::info!(username = %user.username, "password changed");
        Ok(())
    }

    /// Toggle any account's active flag. Idempotent.
    pub async fn set_active(
        &self,
        username: &str,
        caller: &UserSession,
        is_active: bool,
    ) -> Result<UserInfo, GymError> {
        caller.require_active()?;
        caller.require_owner_or_admin(username)?;

        let user = self.store.set_active(username, is_active).await?;
        tracing::info!(username, is_active, by = %caller.username, "account activation set");

        Ok(UserInfo::from(&user))
    }
}
