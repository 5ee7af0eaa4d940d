//! HS256 bearer tokens carrying the `(user id, role)` pair the core
//! consumes as [`AuthUser`].

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domains::{AuthUser, CredentialService, DomainError, Result, Role, User};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    role: String,
    exp: i64,
}

pub struct JwtCredentialService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtCredentialService {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }
}

#[async_trait]
impl CredentialService for JwtCredentialService {
    async fn authenticate(&self, token: &str) -> Result<AuthUser> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| DomainError::Unauthorized("invalid or expired token".into()))?;
        let role = Role::parse(&data.claims.role)
            .ok_or_else(|| DomainError::Unauthorized("invalid or expired token".into()))?;
        Ok(AuthUser {
            id: data.claims.sub,
            role,
        })
    }

    async fn issue(&self, user: &User) -> Result<String> {
        let claims = Claims {
            sub: user.id,
            role: user.role.as_str().to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| DomainError::Internal(format!("token issue: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn admin() -> User {
        User {
            id: Uuid::now_v7(),
            first_name: "Site".into(),
            last_name: "Admin".into(),
            email: "admin@example.edu".into(),
            password_hash: None,
            role: Role::Admin,
            dept: None,
            session: None,
            section: None,
            status: None,
            is_enabled: true,
            is_verified: true,
            avatar: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn issued_token_authenticates_to_same_identity() {
        let svc = JwtCredentialService::new("test-secret", 60);
        let user = admin();
        let token = svc.issue(&user).await.unwrap();
        let auth = svc.authenticate(&token).await.unwrap();
        assert_eq!(auth.id, user.id);
        assert_eq!(auth.role, Role::Admin);
    }

    #[tokio::test]
    async fn wrong_secret_is_unauthorized() {
        let svc = JwtCredentialService::new("test-secret", 60);
        let token = svc.issue(&admin()).await.unwrap();
        let other = JwtCredentialService::new("another-secret", 60);
        assert!(matches!(
            other.authenticate(&token).await,
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let svc = JwtCredentialService::new("test-secret", -5);
        let token = svc.issue(&admin()).await.unwrap();
        assert!(matches!(
            svc.authenticate(&token).await,
            Err(DomainError::Unauthorized(_))
        ));
    }
}
