//! JWT claim structures.
//!
//! - [`Claims`]: Access token claims
//! - [`RefreshTokenClaims`]: Refresh token claims for token renewal

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Distinguishes access tokens from refresh tokens signed with the same secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims for access tokens.
///
/// Carries identity only. No role or permission data is embedded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address
    pub email: String,
    pub kind: TokenKind,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address
    pub email: String,
    pub kind: TokenKind,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
    /// Unique token identifier (JWT ID)
    pub jti: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize() {
        let claims = Claims {
            sub: "user-id-123".to_string(),
            email: "test@example.com".to_string(),
            kind: TokenKind::Access,
            exp: 1234567890,
            iat: 1234567800,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""sub":"user-id-123""#));
        assert!(serialized.contains(r#""kind":"access""#));
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"user-id-456","email":"user@test.com","kind":"access","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "user-id-456");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp, 9999999999);
    }

    #[test]
    fn test_claims_without_kind_rejected() {
        let json = r#"{"sub":"u","email":"e@test.com","exp":1,"iat":1}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }
}
