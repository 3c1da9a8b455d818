use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::AdminError;

/// The two account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(AdminError::InvalidRole {
                value: other.to_string(),
            }),
        }
    }
}

/// Verified token contents: who is calling and with which role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub role: Role,
}

/// Errors from bearer-token handling.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    /// No `Authorization` header on the request.
    MissingHeader,
    /// The header scheme was not `Bearer`.
    InvalidScheme,
    /// The header carried the scheme but no token.
    MissingToken,
    /// The token failed cryptographic validation.
    InvalidToken { reason: String },
    /// The token is valid but the role is not admin.
    AdminRequired,
}

impl AuthError {
    pub fn status(&self) -> u16 {
        match self {
            Self::AdminRequired => 403,
            _ => 401,
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::AdminRequired => Some("ADMIN_REQUIRED"),
            _ => None,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "missing Authorization header"),
            Self::InvalidScheme => {
                write!(f, "unsupported authorization scheme: expected 'Bearer <token>'")
            }
            Self::MissingToken => write!(f, "Authorization header carries no token"),
            Self::InvalidToken { reason } => write!(f, "invalid token: {reason}"),
            Self::AdminRequired => write!(f, "admin role required"),
        }
    }
}

impl std::error::Error for AuthError {}

/// External collaborator performing the cryptographic token work.
///
/// The engine only threads tokens through this trait; the concrete JWT
/// implementation lives with the server.
pub trait TokenService: Send + Sync {
    /// Encodes claims into a token valid for `ttl_secs`.
    fn issue(&self, claims: &Claims, ttl_secs: u64) -> Result<String, AuthError>;

    /// Validates a token and extracts its claims.
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// Extracts the token from an `Authorization: Bearer ...` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let rest = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or(AuthError::InvalidScheme)?;
    let token = rest.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Verifies a bearer header end to end and requires the admin role.
pub fn require_admin(
    tokens: &dyn TokenService,
    header: Option<&str>,
) -> Result<Claims, AuthError> {
    let token = bearer_token(header)?;
    let claims = tokens.verify(token)?;
    if !claims.role.is_admin() {
        return Err(AuthError::AdminRequired);
    }
    Ok(claims)
}
