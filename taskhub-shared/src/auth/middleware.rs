/// Request authentication
///
/// Turns an `Authorization: Bearer <token>` header into an [`AuthContext`].
/// The HTTP layer calls [`authenticate_bearer`] and stores the resulting
/// context in the request extensions; handlers read it back with axum's
/// `Extension` extractor.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::jwt::{create_token, Claims};
/// use taskhub_shared::auth::middleware::authenticate_bearer;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "your-secret-key-at-least-32-bytes";
/// let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), "member", "m@example.com");
/// let header = format!("Bearer {}", create_token(&claims, secret)?);
///
/// let auth = authenticate_bearer(Some(&header), secret)?;
/// assert_eq!(auth.role, "member");
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};

/// Identity of an authenticated caller
///
/// Built only from a validated token. `org_id` is the caller's tenant and
/// the sole source for [`crate::tenancy::TenantScope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub org_id: Uuid,

    /// Role name as carried in the token; checked against the permission table
    pub role: String,

    pub email: String,
}

impl AuthContext {
    pub fn new(user_id: Uuid, org_id: Uuid, role: &str, email: &str) -> Self {
        Self {
            user_id,
            org_id,
            role: role.to_string(),
            email: email.to_string(),
        }
    }
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            org_id: claims.org_id,
            role: claims.role,
            email: claims.email,
        }
    }
}

/// Error type for request authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token rejected
    #[error("{0}")]
    InvalidToken(String),
}

/// Validates a raw Authorization header value
///
/// # Errors
///
/// - `AuthError::MissingCredentials` when the header is absent
/// - `AuthError::InvalidFormat` when it is not a Bearer token
/// - `AuthError::InvalidToken` when the token fails validation or has expired
pub fn authenticate_bearer(header: Option<&str>, secret: &str) -> Result<AuthContext, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
    })?;

    Ok(AuthContext::from(claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_auth_context_from_claims() {
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();
        let context = AuthContext::from(Claims::new(user_id, org_id, "manager", "m@example.com"));

        assert_eq!(context, AuthContext::new(user_id, org_id, "manager", "m@example.com"));
    }

    #[test]
    fn test_authenticate_bearer() {
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), "admin", "a@example.com");
        let token = create_token(&claims, SECRET).unwrap();

        let auth = authenticate_bearer(Some(&format!("Bearer {}", token)), SECRET).unwrap();
        assert_eq!(auth.user_id, claims.sub);
        assert_eq!(auth.org_id, claims.org_id);
    }

    #[test]
    fn test_authenticate_bearer_rejections() {
        assert!(matches!(
            authenticate_bearer(None, SECRET),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            authenticate_bearer(Some("Basic abc"), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            authenticate_bearer(Some("Bearer "), SECRET),
            Err(AuthError::InvalidFormat(_))
        ));
        assert!(matches!(
            authenticate_bearer(Some("Bearer garbage"), SECRET),
            Err(AuthError::InvalidToken(_))
        ));

        let expired = Claims::with_expiration(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "admin",
            "a@example.com",
            Duration::seconds(-3600),
        );
        let token = create_token(&expired, SECRET).unwrap();
        match authenticate_bearer(Some(&format!("Bearer {}", token)), SECRET) {
            Err(AuthError::InvalidToken(msg)) => assert_eq!(msg, "Token expired"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
