//! SQLite adapter: Implementation of the identity provider port.
//!
//! Provides local account storage and session persistence for
//! deployments without a hosted identity backend.
//!
//! # Security
//!
//! Passwords are never stored: accounts hold Argon2id hashes, verified
//! with the `argon2` password-hash API. The persisted session row holds
//! only the account uid.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from
//! panic in another thread) will cause panic. This fail-fast behavior is
//! intentional for data integrity in healthcare applications.

use std::path::Path;
use std::sync::Mutex;

use argon2::password_hash::{
    rand_core::OsRng as SaltRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use rand::RngCore;
use rusqlite::{params, Connection};

use crate::domain::Identity;
use crate::ports::IdentityService;

/// Error type for identity operations.
///
/// The display text of these variants is the user-visible reason carried
/// through the session store.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("The email address is already in use by another account")]
    EmailInUse,

    #[error("The email address is badly formatted")]
    InvalidEmail,

    #[error("Password should be at least 6 characters")]
    WeakPassword,

    #[error("The supplied credentials are incorrect or the account does not exist")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Shortest password the provider itself accepts. The session store
/// enforces the same bound locally, so this rule is only observable to
/// callers bypassing it.
const PROVIDER_MIN_PASSWORD_LEN: usize = 6;

/// SQLite-backed identity provider.
pub struct SqliteIdentityService {
    conn: Mutex<Connection>,
}

impl SqliteIdentityService {
    /// Open (or create) the identity database at the given path.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, IdentityError> {
        let conn = Connection::open(path)?;
        let service = Self {
            conn: Mutex::new(conn),
        };
        service.init_schema()?;
        Ok(service)
    }

    /// Create an in-memory identity database (for testing).
    ///
    /// # Errors
    /// Returns error if the database cannot be created.
    pub fn in_memory() -> Result<Self, IdentityError> {
        let conn = Connection::open_in_memory()?;
        let service = Self {
            conn: Mutex::new(conn),
        };
        service.init_schema()?;
        Ok(service)
    }

    fn init_schema(&self) -> Result<(), IdentityError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS accounts (
                uid TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                uid TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    fn generate_uid() -> String {
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn hash_password(password: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut SaltRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| IdentityError::Hash(e.to_string()))
    }

    fn verify_password(password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn persist_session(conn: &Connection, uid: &str) -> Result<(), IdentityError> {
        conn.execute(
            "INSERT OR REPLACE INTO session (id, uid) VALUES (1, ?1)",
            params![uid],
        )?;
        Ok(())
    }
}

impl IdentityService for SqliteIdentityService {
    type Error = IdentityError;

    fn sign_in(&self, email: &str, password: &str) -> Result<Identity, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let row = conn.query_row(
            "SELECT uid, password_hash FROM accounts WHERE email = ?1",
            params![email],
            |row| {
                let uid: String = row.get(0)?;
                let hash: String = row.get(1)?;
                Ok((uid, hash))
            },
        );

        let (uid, stored_hash) = match row {
            Ok(found) => found,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(IdentityError::InvalidCredentials)
            }
            Err(e) => return Err(e.into()),
        };

        if !Self::verify_password(password, &stored_hash) {
            return Err(IdentityError::InvalidCredentials);
        }

        Self::persist_session(&conn, &uid)?;
        tracing::info!("Opened session for existing account");
        Ok(Identity::new(uid))
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<Identity, Self::Error> {
        if !email.contains('@') {
            return Err(IdentityError::InvalidEmail);
        }
        if password.len() < PROVIDER_MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword);
        }

        let conn = self.conn.lock().expect("Lock failed");

        let existing: i64 = conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Err(IdentityError::EmailInUse);
        }

        let uid = Self::generate_uid();
        let hash = Self::hash_password(password)?;
        let now = chrono::Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO accounts (uid, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![uid, email, hash, now],
        )?;

        Self::persist_session(&conn, &uid)?;
        tracing::info!("Created account and opened session");
        Ok(Identity::new(uid))
    }

    fn sign_out(&self) {
        let conn = self.conn.lock().expect("Lock failed");
        // Idempotent: deleting an absent session row is not an error.
        if let Err(e) = conn.execute("DELETE FROM session WHERE id = 1", []) {
            tracing::warn!("Failed to clear persisted session: {e}");
        }
    }

    fn current_session(&self) -> Option<Identity> {
        let conn = self.conn.lock().expect("Lock failed");

        match conn.query_row("SELECT uid FROM session WHERE id = 1", [], |row| {
            row.get::<_, String>(0)
        }) {
            Ok(uid) => Some(Identity::new(uid)),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                tracing::warn!("Failed to query persisted session: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sign_up_then_sign_in() {
        let service = SqliteIdentityService::in_memory().expect("Should create db");

        let created = service
            .sign_up("a@b.com", "secret1")
            .expect("Sign-up should succeed");
        service.sign_out();

        let signed_in = service
            .sign_in("a@b.com", "secret1")
            .expect("Sign-in should succeed");
        assert_eq!(created, signed_in);
    }

    #[test]
    fn test_sign_in_rejects_wrong_password_and_unknown_email() {
        let service = SqliteIdentityService::in_memory().expect("Should create db");
        service
            .sign_up("a@b.com", "secret1")
            .expect("Sign-up should succeed");

        assert!(matches!(
            service.sign_in("a@b.com", "wrong"),
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            service.sign_in("nobody@b.com", "secret1"),
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_sign_up_rejects_duplicate_email() {
        let service = SqliteIdentityService::in_memory().expect("Should create db");
        service
            .sign_up("a@b.com", "secret1")
            .expect("Sign-up should succeed");

        assert!(matches!(
            service.sign_up("a@b.com", "other-password"),
            Err(IdentityError::EmailInUse)
        ));
    }

    #[test]
    fn test_sign_up_rejects_weak_password_and_bad_email() {
        let service = SqliteIdentityService::in_memory().expect("Should create db");

        assert!(matches!(
            service.sign_up("a@b.com", "abc"),
            Err(IdentityError::WeakPassword)
        ));
        assert!(matches!(
            service.sign_up("not-an-email", "secret1"),
            Err(IdentityError::InvalidEmail)
        ));
    }

    #[test]
    fn test_session_persists_across_reopen() {
        let dir = tempdir().expect("Should create temp dir");
        let db_path = dir.path().join("identity.db");

        let uid = {
            let service =
                SqliteIdentityService::new(&db_path).expect("Should create db");
            service
                .sign_up("a@b.com", "secret1")
                .expect("Sign-up should succeed")
                .uid
        };

        let reopened = SqliteIdentityService::new(&db_path).expect("Should reopen db");
        let restored = reopened
            .current_session()
            .expect("Session should be persisted");
        assert_eq!(restored.uid, uid);

        reopened.sign_out();
        assert!(reopened.current_session().is_none());

        let reopened_again = SqliteIdentityService::new(&db_path).expect("Should reopen db");
        assert!(reopened_again.current_session().is_none());
    }

    #[test]
    fn test_stored_hash_is_not_the_password() {
        let service = SqliteIdentityService::in_memory().expect("Should create db");
        service
            .sign_up("a@b.com", "secret1")
            .expect("Sign-up should succeed");

        let conn = service.conn.lock().expect("Lock failed");
        let hash: String = conn
            .query_row(
                "SELECT password_hash FROM accounts WHERE email = 'a@b.com'",
                [],
                |row| row.get(0),
            )
            .expect("Account row should exist");
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("secret1"));
    }
}
