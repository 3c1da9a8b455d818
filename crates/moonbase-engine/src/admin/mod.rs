//! Administrative domain: accounts, API keys, roles, and the token and
//! password-hashing seams.

pub mod apikeys;
pub mod error;
pub mod password;
pub mod token;
pub mod users;

pub use apikeys::{ApiKey, ApiKeyService, IssuedApiKey};
pub use error::AdminError;
pub use password::{Argon2Hashing, PasswordHashing};
pub use token::{bearer_token, require_admin, AuthError, Claims, Role, TokenService};
pub use users::{NewUser, User, UserPatch, UserService};
