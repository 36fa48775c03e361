use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use domains::{CredentialHasher, DomainError, Result};

/// Argon2id with the crate's default parameters; hashes are stored in PHC
/// string form so parameters travel with each hash.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| DomainError::Internal(format!("password hashing failed: {err}")))
    }

    /// Verifies a password against a stored hash. Malformed hashes never match.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(%err, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok()
    }
}
