use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared::Role;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Token claims issued by the family account service.
///
/// `sub` is the parent's user id or, for a child token, the child id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub family_id: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn is_parent(&self) -> bool {
        self.role == Role::Parent
    }

    /// A parent may act for any child of the family, a child only for itself.
    pub fn can_act_for_child(&self, child_id: &Uuid) -> bool {
        match self.role {
            Role::Parent => true,
            Role::Child => self.sub == *child_id,
        }
    }
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[cfg(test)]
pub fn create_jwt(
    subject: &Uuid,
    family_id: &Uuid,
    role: Role,
    secret: &str,
    expiration_hours: i64,
) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = Utc::now();
    let claims = Claims {
        sub: *subject,
        family_id: *family_id,
        role,
        exp: (now + Duration::hours(expiration_hours)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
