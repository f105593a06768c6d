use argon2::{
    password_hash::{self, PasswordHash, SaltString},
    Argon2, PasswordHasher as _, PasswordVerifier as _,
};
use model::Principal;
use rand::rngs::OsRng;
use tracing::error;

/// Turns plaintext secrets into storage-safe hashes.
pub trait PasswordHasher: Send + Sync + std::fmt::Debug {
    fn hash_password(&self, plain: &str) -> anyhow::Result<String>;

    /// `Ok(false)` on a mismatch, `Err` when `hash` cannot be checked at all.
    fn verify_password(&self, plain: &str, hash: &str) -> anyhow::Result<bool>;

    /// Checks `plain` against the credential stored for `principal`.
    fn verify_principal(&self, principal: &dyn Principal, plain: &str) -> anyhow::Result<bool> {
        self.verify_password(plain, principal.credential_hash())
    }
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Default, Clone)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash_password(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!(error = %e, "Failed to hash user password");
                anyhow::anyhow!("password hashing failed: {}", e)
            })
    }

    fn verify_password(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let stored = PasswordHash::new(hash)
            .map_err(|e| anyhow::anyhow!("stored password is not a PHC string: {}", e))?;

        match Argon2::default().verify_password(plain.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "Failed to verify user password");
                Err(anyhow::anyhow!("password verification failed: {}", e))
            }
        }
    }
}
