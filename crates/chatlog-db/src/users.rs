use sha2::{Digest, Sha256};
use tracing::info;

use crate::Database;
use crate::error::StoreError;
use crate::models::UserRow;

const CREDENTIALS_REQUIRED: &str = "Username and password are required";

/// Unsalted single-pass SHA-256, hex encoded.
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl Database {
    // -- Credential store --

    pub fn register(&self, username: &str, password: &str) -> Result<(), StoreError> {
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::MissingField(CREDENTIALS_REQUIRED));
        }

        self.users.with_lock(|table| {
            let mut users: Vec<UserRow> = table.read()?;
            if users.iter().any(|u| u.username == username) {
                return Err(StoreError::DuplicateUsername);
            }

            users.push(UserRow {
                username: username.to_string(),
                password_hash: password_digest(password),
            });
            table.rewrite(&users)?;
            Ok(())
        })?;

        info!("Registered user {}", username);
        Ok(())
    }

    /// Check a username/password pair. An unknown user and a wrong password
    /// are the same error.
    pub fn login(&self, username: &str, password: &str) -> Result<String, StoreError> {
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::MissingField(CREDENTIALS_REQUIRED));
        }

        let user = self
            .get_user(username)?
            .ok_or(StoreError::InvalidCredentials)?;

        if user.password_hash != password_digest(password) {
            return Err(StoreError::InvalidCredentials);
        }
        Ok(user.username)
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.users.with_lock(|table| {
            let users: Vec<UserRow> = table.read()?;
            Ok(users.into_iter().find(|u| u.username == username))
        })
    }

    pub fn user_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.get_user(username)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_MAX_DATA_BYTES;

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), DEFAULT_MAX_DATA_BYTES).unwrap();
        (dir, db)
    }

    #[test]
    fn digest_is_plain_sha256_hex() {
        assert_eq!(
            password_digest("secret"),
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (_dir, db) = open_db();

        db.register("alice", "secret").unwrap();
        let err = db.register("alice", "other").unwrap_err();

        assert!(matches!(err, StoreError::DuplicateUsername));
    }

    #[test]
    fn empty_fields_are_missing() {
        let (_dir, db) = open_db();

        assert!(matches!(db.register("", "pw"), Err(StoreError::MissingField(_))));
        assert!(matches!(db.register("bob", ""), Err(StoreError::MissingField(_))));
        assert!(matches!(db.login("", ""), Err(StoreError::MissingField(_))));
    }

    #[test]
    fn login_checks_digest() {
        let (_dir, db) = open_db();
        db.register("alice", "secret").unwrap();

        assert_eq!(db.login("alice", "secret").unwrap(), "alice");
        assert!(matches!(db.login("alice", "nope"), Err(StoreError::InvalidCredentials)));
        assert!(matches!(db.login("mallory", "secret"), Err(StoreError::InvalidCredentials)));
    }

    #[test]
    fn concurrent_registrations_are_all_kept() {
        let (_dir, db) = open_db();
        let db = std::sync::Arc::new(db);

        let handles: Vec<_> = (0..16)
            .map(|n| {
                let db = db.clone();
                std::thread::spawn(move || db.register(&format!("user{n}"), "pw").unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for n in 0..16 {
            assert!(db.user_exists(&format!("user{n}")).unwrap());
        }
    }

    #[test]
    fn users_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = Database::open(dir.path(), DEFAULT_MAX_DATA_BYTES).unwrap();
            db.register("alice", "secret").unwrap();
        }
        let db = Database::open(dir.path(), DEFAULT_MAX_DATA_BYTES).unwrap();

        assert!(db.user_exists("alice").unwrap());
        let contents = std::fs::read_to_string(dir.path().join(crate::USERS_FILE)).unwrap();
        assert!(contents.starts_with("username,password_hash\n"));
    }
}
