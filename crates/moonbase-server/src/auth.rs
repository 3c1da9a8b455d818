use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use moonbase_engine::admin::{require_admin, AuthError, Claims, Role, TokenService};
use serde::{Deserialize, Serialize};

const ISSUER: &str = "moonbase";

/// HS256 JWT implementation of the engine's [`TokenService`] seam.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String,
    username: String,
    role: Role,
    iss: String,
    iat: u64,
    exp: u64,
}

impl JwtTokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, claims: &Claims, ttl_secs: u64) -> Result<String, AuthError> {
        let now = unix_now();
        let jwt = JwtClaims {
            sub: claims.user_id.clone(),
            username: claims.username.clone(),
            role: claims.role,
            iss: ISSUER.to_string(),
            iat: now,
            exp: now + ttl_secs,
        };
        encode(&Header::default(), &jwt, &self.encoding).map_err(|e| AuthError::InvalidToken {
            reason: e.to_string(),
        })
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        let data = decode::<JwtClaims>(token, &self.decoding, &validation).map_err(|e| {
            AuthError::InvalidToken {
                reason: e.to_string(),
            }
        })?;
        Ok(Claims {
            user_id: data.claims.sub,
            username: data.claims.username,
            role: data.claims.role,
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Runs the admin gate against a request's headers.
pub fn admin_claims(tokens: &dyn TokenService, headers: &HeaderMap) -> Result<Claims, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    require_admin(tokens, header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Claims {
        Claims {
            user_id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".into(),
            username: "root".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn issue_then_verify_roundtrip() {
        let service = JwtTokenService::new(b"test-secret");
        let token = service.issue(&claims(), 3600).unwrap();
        let verified = service.verify(&token).unwrap();
        assert_eq!(verified, claims());
    }

    #[test]
    fn wrong_secret_rejected() {
        let issuer = JwtTokenService::new(b"secret-a");
        let verifier = JwtTokenService::new(b"secret-b");
        let token = issuer.issue(&claims(), 3600).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[test]
    fn garbage_token_rejected() {
        let service = JwtTokenService::new(b"test-secret");
        assert!(matches!(
            service.verify("not.a.jwt"),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[test]
    fn admin_gate_reads_header_map() {
        let service = JwtTokenService::new(b"test-secret");
        let token = service.issue(&claims(), 3600).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        let verified = admin_claims(&service, &headers).unwrap();
        assert_eq!(verified.username, "root");

        let empty = HeaderMap::new();
        assert!(matches!(
            admin_claims(&service, &empty),
            Err(AuthError::MissingHeader)
        ));
    }

    #[test]
    fn non_admin_role_gated() {
        let service = JwtTokenService::new(b"test-secret");
        let token = service
            .issue(
                &Claims {
                    user_id: "01ARZ3NDEKTSV4RRFFQ69G5FAW".into(),
                    username: "sam".into(),
                    role: Role::User,
                },
                3600,
            )
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        assert!(matches!(
            admin_claims(&service, &headers),
            Err(AuthError::AdminRequired)
        ));
    }
}
