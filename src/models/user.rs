use crate::error::ServiceError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;

/// Database representation of a user
#[derive(Clone, FromRow, Serialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string, never the password itself
    #[serde(skip_serializing)]
    pub password: String,
    pub profile_picture: Option<String>,
    pub created_at: i64,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("profile_picture", &self.profile_picture)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl User {
    /// Check a candidate password against the stored hash
    pub fn verify_password(&self, candidate: &SecretString) -> Result<bool, ServiceError> {
        let hash = PasswordHash::new(&self.password).map_err(|e| {
            ServiceError::MalformedData(format!("password hash of user {}: {e}", self.id))
        })?;
        Ok(Argon2::default()
            .verify_password(candidate.expose_secret().as_bytes(), &hash)
            .is_ok())
    }
}

/// Registration payload. Only the argon2 hash of `password` is persisted.
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub profile_picture: Option<String>,
}

impl NewUser {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password: SecretString::from(password.to_string()),
            profile_picture: None,
        }
    }

    pub fn with_profile_picture(mut self, path: &str) -> Self {
        self.profile_picture = Some(path.to_string());
        self
    }

    /// Salted argon2id hash of the password in PHC format
    pub fn password_hash(&self) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(self.password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::HashError(e.to_string()))
    }
}
