use actix_web::HttpRequest;

use crate::services::auth::{self as auth_service, Claims};

/// Extract and verify the token claims from the Authorization header
pub fn extract_claims(req: &HttpRequest, jwt_secret: &str) -> Result<Claims, AuthMiddlewareError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or(AuthMiddlewareError::MissingToken)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthMiddlewareError::InvalidToken)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or(AuthMiddlewareError::InvalidToken)?;

    auth_service::verify_jwt(token, jwt_secret).map_err(|e| {
        log::debug!("Rejected bearer token: {}", e);
        AuthMiddlewareError::InvalidToken
    })
}

#[derive(Debug)]
pub enum AuthMiddlewareError {
    MissingToken,
    InvalidToken,
}

impl std::fmt::Display for AuthMiddlewareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMiddlewareError::MissingToken => write!(f, "Missing authorization token"),
            AuthMiddlewareError::InvalidToken => write!(f, "Invalid authorization token"),
        }
    }
}

impl std::error::Error for AuthMiddlewareError {}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use shared::Role;
    use uuid::Uuid;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthMiddlewareError::MissingToken.to_string(),
            "Missing authorization token"
        );
        assert_eq!(
            AuthMiddlewareError::InvalidToken.to_string(),
            "Invalid authorization token"
        );
    }

    #[test]
    fn test_extract_claims() {
        let family_id = Uuid::new_v4();
        let token = auth_service::create_jwt(&Uuid::new_v4(), &family_id, Role::Parent, "secret", 1);

        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_http_request();
        assert_eq!(extract_claims(&req, "secret").unwrap().family_id, family_id);

        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            extract_claims(&req, "secret"),
            Err(AuthMiddlewareError::MissingToken)
        ));

        let req = TestRequest::default()
            .insert_header(("Authorization", token))
            .to_http_request();
        assert!(matches!(
            extract_claims(&req, "secret"),
            Err(AuthMiddlewareError::InvalidToken)
        ));
    }
}
