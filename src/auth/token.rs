use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identifier of the authenticated user.
    #[serde(rename = "id")]
    pub user_id: i32,
    /// Whether the user holds the administrator role.
    pub is_admin: bool,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp. Absent when tokens are issued without a TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Issues and verifies HS256 session tokens.
///
/// The service is stateless: verification depends only on the token and the
/// signing secret, which is loaded once at startup and never changes.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Option<Duration>,
}

impl TokenService {
    /// Creates a token service signing with `secret`.
    ///
    /// `ttl` of `None` issues tokens without an `exp` claim, which then never expire.
    pub fn new(secret: &str, ttl: Option<Duration>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issues a signed token binding `user_id` and `is_admin`.
    pub fn issue(&self, user_id: i32, is_admin: bool) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = match self.ttl {
            Some(ttl) => {
                let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
                    AppError::InternalServerError("Token expiry is out of range".into())
                })?;
                Some(expires_at.timestamp())
            }
            None => None,
        };
        let claims = Claims {
            user_id,
            is_admin,
            iat: now.timestamp(),
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a token's signature (and expiry, when a TTL is configured) and
    /// returns its claims.
    ///
    /// Any failure is reported as `AppError::Unauthorized("Invalid token")`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation())?;
        Ok(data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        if self.ttl.is_none() {
            validation.required_spec_claims.clear();
        }
        validation
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Some(Duration::hours(24)))
    }

    fn assert_invalid(result: Result<Claims, AppError>) {
        match result {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Invalid token"),
            Ok(claims) => panic!("Token should have been rejected, got {:?}", claims),
            Err(e) => panic!("Unexpected error type: {:?}", e),
        }
    }

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = service("test_secret_for_gen_verify");
        for (user_id, is_admin) in [(1, false), (42, true), (i32::MAX, false)] {
            let token = tokens.issue(user_id, is_admin).unwrap();
            let claims = tokens.verify(&token).unwrap();
            assert_eq!(claims.user_id, user_id);
            assert_eq!(claims.is_admin, is_admin);
            assert!(claims.exp.unwrap() > claims.iat);
        }
    }

    #[test]
    fn test_expiry_past_the_calendar_is_an_error() {
        let tokens = TokenService::new("far_future", Some(Duration::hours(10_000_000_000)));
        match tokens.issue(1, false) {
            Err(AppError::InternalServerError(_)) => {}
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_token_without_ttl_round_trips() {
        let tokens = TokenService::new("no_expiry_secret", None);
        let token = tokens.issue(7, true).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.user_id, 7);
        assert!(claims.is_admin);
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = service("secret_a").issue(1, true).unwrap();
        assert_invalid(service("secret_b").verify(&token));

        let token = TokenService::new("secret_a", None).issue(1, true).unwrap();
        assert_invalid(TokenService::new("secret_b", None).verify(&token));
    }

    #[test]
    fn test_token_expiration() {
        let secret = "test_secret_for_expiration";
        let issued = Utc::now() - Duration::hours(3);
        let claims_expired = Claims {
            user_id: 2,
            is_admin: false,
            iat: issued.timestamp(),
            exp: Some((issued + Duration::hours(1)).timestamp()),
        };
        let expired_token = encode(
            &Header::default(),
            &claims_expired,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert_invalid(service(secret).verify(&expired_token));
    }

    #[test]
    fn test_token_without_exp_rejected_when_ttl_enabled() {
        let secret = "shared_secret";
        let token = TokenService::new(secret, None).issue(3, false).unwrap();
        assert_invalid(service(secret).verify(&token));
    }

    #[test]
    fn test_tampered_and_malformed_tokens_are_rejected() {
        let tokens = service("tamper_secret");
        let token = tokens.issue(5, false).unwrap();

        // Swap the payload for one claiming admin, keeping the original signature.
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = Claims {
            user_id: 5,
            is_admin: true,
            iat: Utc::now().timestamp(),
            exp: Some((Utc::now() + Duration::hours(1)).timestamp()),
        };
        let forged = encode(
            &Header::default(),
            &forged_claims,
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_invalid(tokens.verify(&tampered));

        assert_invalid(tokens.verify(""));
        assert_invalid(tokens.verify("not-a-jwt"));
        assert_invalid(tokens.verify("a.b.c"));
    }

    #[test]
    fn test_claims_use_wire_names() {
        let claims = Claims {
            user_id: 9,
            is_admin: true,
            iat: 100,
            exp: None,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["id"], 9);
        assert_eq!(json["is_admin"], true);
        assert!(json.get("exp").is_none());
    }
}
