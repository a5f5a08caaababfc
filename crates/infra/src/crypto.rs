//! Argon2id password hasher.

use argon2::password_hash::{
    Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use warta_auth::{PasswordError, PasswordHasher};

const OUTPUT_LENGTH: usize = 32;

/// Argon2id hasher producing PHC strings with a random salt.
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn new(memory_cost: u32, iterations: u32, parallelism: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_cost, iterations, parallelism, Some(OUTPUT_LENGTH))
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::MalformedHash)?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => Err(PasswordError::Hashing(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2PasswordHasher {
        // Small cost so tests stay fast.
        Argon2PasswordHasher::new(1024, 1, 1).unwrap()
    }

    #[test]
    fn hash_verifies_and_is_salted() {
        let hasher = hasher();
        let first = hasher.hash("rahasia123").unwrap();
        let second = hasher.hash("rahasia123").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(hasher.verify("rahasia123", &first).unwrap());
        assert!(!hasher.verify("salah", &first).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert_eq!(
            hasher().verify("anything", "not-a-phc-string"),
            Err(PasswordError::MalformedHash)
        );
    }
}
