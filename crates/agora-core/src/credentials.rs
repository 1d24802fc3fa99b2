use std::sync::Arc;

use agora_db::Database;
use agora_types::models::{Identity, Session};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand_core::OsRng;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{FieldErrors, ForumError};
use crate::sessions::SessionStore;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 6;

/// Registration and login. A successful call of either always ends with
/// the user holding exactly one live session.
#[derive(Clone)]
pub struct CredentialManager {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    sessions: SessionStore,
}

impl CredentialManager {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, sessions: SessionStore) -> Self {
        Self { db, clock, sessions }
    }

    pub fn register(&self, email: &str, username: &str, password: &str) -> Result<(Identity, Session), ForumError> {
        let email = email.trim();
        let username = username.trim();

        let mut errors = FieldErrors::new();
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(email) {
            errors.add("email", "Email must look like name@domain.tld");
        }
        if !is_valid_username(username) {
            errors.add("username", "Username must be 3-20 letters, digits or underscores");
        }
        if password.chars().count() < PASSWORD_MIN {
            errors.add("password", "Password must be at least 6 characters");
        }
        if let Err(e) = errors.into_result() {
            debug!("Registration rejected: {}", e);
            return Err(e);
        }

        // Fast feedback only; the UNIQUE constraints decide races.
        if self.db.email_taken(email)? {
            return Err(ForumError::Conflict("Email is already registered".into()));
        }
        if self.db.username_taken(username)? {
            return Err(ForumError::Conflict("Username is already taken".into()));
        }

        let password_hash = hash_password(password)?;

        let user_id = self
            .db
            .create_user(email, username, &password_hash, self.clock.now())
            .map_err(|e| match ForumError::from(e) {
                ForumError::Conflict(_) => ForumError::Conflict("Email or username is already taken".into()),
                other => other,
            })?;

        let session = self.sessions.create_exclusive(user_id)?;
        info!("Registered user {} ({})", username, user_id);

        Ok((
            Identity {
                user_id,
                username: username.to_string(),
            },
            session,
        ))
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Result<(Identity, Session), ForumError> {
        let user = self
            .db
            .get_user_by_email(email.trim())?
            .ok_or_else(|| ForumError::NotFound("User".into()))?;

        if !verify_password(password, &user.password)? {
            debug!("Login rejected for user {}", user.id);
            return Err(ForumError::InvalidCredentials);
        }

        let session = self.sessions.create_exclusive(user.id)?;
        info!("User {} logged in", user.username);

        Ok((
            Identity {
                user_id: user.id,
                username: user.username,
            },
            session,
        ))
    }
}

fn hash_password(password: &str) -> Result<String, ForumError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ForumError::Hashing(e.to_string()))
}

/// `Ok(false)` on mismatch; `Err` only if the stored hash is unreadable.
fn verify_password(password: &str, stored: &str) -> Result<bool, ForumError> {
    let parsed = PasswordHash::new(stored).map_err(|e| ForumError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// `local@domain.tld`: one `@`, no whitespace, and a dotted domain with
/// non-empty labels.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !host.split('.').any(str::is_empty) && !tld.is_empty()
}

fn is_valid_username(username: &str) -> bool {
    (USERNAME_MIN..=USERNAME_MAX).contains(&username.len())
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
