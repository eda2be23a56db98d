use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::Claims;
use crate::errors::GymError;
use crate::models::User;

/// JWT token service for creating and validating access tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .field("access_token_expires_in", &self.access_token_expires_in)
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &str, access_token_expires_in: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in,
        }
    }

    /// Create an access token for a user
    pub fn create_access_token(&self, user: &User) -> Result<String, GymError> {
        let now = Utc::now();
        let exp = now + self.access_token_expires_in;

        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            ver: user.credential_version,
            role: user.role,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(GymError::Token)
    }

    /// Validate and decode a token. Any failure is an authentication failure.
    pub fn validate_token(&self, token: &str) -> Result<Claims, GymError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "rejected access token");
                GymError::AuthenticationFailure
            })
    }

    pub fn access_token_expires_in_seconds(&self) -> usize {
        self.access_token_expires_in.num_seconds().max(0) as usize
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, GymError> {
    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(GymError::AuthenticationFailure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, Role};
    use assert_matches::assert_matches;

    fn user(username: &str, role: Role) -> User {
        NewUser {
            first_name: "John".into(),
            last_name: "Doe".into(),
            username: username.into(),
            password_hash: "hash".into(),
            role,
        }
        .into_user()
    }

    #[test]
    fn test_jwt_creation_and_validation() {
        let jwt_service = JwtService::new("test_secret", Duration::minutes(15));

        let john = user("John.Doe", Role::Trainee);
        let token = jwt_service.create_access_token(&john).unwrap();
        let claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "John.Doe");
        assert_eq!(claims.uid, john.id);
        assert_eq!(claims.ver, 0);
        assert_eq!(claims.role, Role::Trainee);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("secret_a", Duration::minutes(15));
        let verifier = JwtService::new("secret_b", Duration::minutes(15));

        let token = issuer.create_access_token(&user("John.Doe", Role::Trainee)).unwrap();
        assert_matches!(
            verifier.validate_token(&token),
            Err(GymError::AuthenticationFailure)
        );
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Past the default 60s leeway.
        let jwt_service = JwtService::new("test_secret", Duration::minutes(-5));
        let token = jwt_service.create_access_token(&user("John.Doe", Role::Trainee)).unwrap();

        assert_matches!(
            jwt_service.validate_token(&token),
            Err(GymError::AuthenticationFailure)
        );
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(extract_bearer_token("Bearer test_token").unwrap(), "test_token");
        assert!(extract_bearer_token("Basic dXNlcjpwYXNz").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
    }

    #[test]
    fn test_tokens_have_distinct_ids() {
        let jwt_service = JwtService::new("test_secret", Duration::minutes(15));
        let admin = user("admin", Role::Admin);
        let first = jwt_service.create_access_token(&admin).unwrap();
        let second = jwt_service.create_access_token(&admin).unwrap();

        let first_jti = jwt_service.validate_token(&first).unwrap().jti;
        let second_jti = jwt_service.validate_token(&second).unwrap().jti;
        assert_ne!(first_jti, second_jti);
    }
}
