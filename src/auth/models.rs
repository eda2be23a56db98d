use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::GymError;
use crate::models::{Role, User, UserInfo};

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Username
    pub uid: Uuid,    // User id, so a reissued username does not match
    pub ver: i32,     // Credential version at issue time
    pub role: Role,   // Role at issue time
    pub exp: usize,   // Expiration time
    pub iat: usize,   // Issued at
    pub jti: String,  // JWT ID
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub user: UserInfo,
}

/// Authenticated caller, rebuilt from the credential store on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSession {
    pub username: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<&User> for UserSession {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

impl UserSession {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_owner(&self, username: &str) -> bool {
        self.username == username
    }

    pub fn require_admin(&self) -> Result<(), GymError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(GymError::access_denied("administrator privilege required"))
        }
    }

    pub fn require_owner_or_admin(&self, username: &str) -> Result<(), GymError> {
        if self.is_admin() || self.is_owner(username) {
            Ok(())
        } else {
            Err(GymError::access_denied(format!(
                "'{}' may not modify '{}'",
                self.username, username
            )))
        }
    }

    /// Mutations need an active caller.
    pub fn require_active(&self) -> Result<(), GymError> {
        if self.is_active {
            Ok(())
        } else {
            Err(GymError::access_denied(format!(
                "account '{}' is deactivated",
                self.username
            )))
        }
    }
}
