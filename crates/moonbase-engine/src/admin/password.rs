use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::Argon2;

/// External collaborator for password hashing.
///
/// The services only ever see opaque hash strings through this trait; the
/// concrete primitive is swappable (and tests use a cheap stand-in).
pub trait PasswordHashing: Send + Sync {
    /// Hashes a plaintext password into a self-describing hash string.
    fn hash(&self, password: &str) -> Result<String, String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id-backed implementation with per-password random salts.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hashing;

impl PasswordHashing for Argon2Hashing {
    fn hash(&self, password: &str) -> Result<String, String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| e.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
