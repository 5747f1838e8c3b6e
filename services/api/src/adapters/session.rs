//! services/api/src/adapters/session.rs
//!
//! This module contains the ambient-session adapter, the concrete
//! implementation of the `SessionService` port. Credentials live in the
//! `users` table; the signed-in user is process-ambient state, the way a
//! device app holds its current account.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use booktrack_core::domain::{User, UserCredentials};
use booktrack_core::ports::{PortError, PortResult, SessionService};
use sqlx::{FromRow, SqlitePool};
use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `SessionService` over a local credentials table.
pub struct AuthSessionAdapter {
    pool: SqlitePool,
    current: RwLock<Option<User>>,
}

impl AuthSessionAdapter {
    /// Creates a new `AuthSessionAdapter` with no user signed in.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            current: RwLock::new(None),
        }
    }

    async fn credentials_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let record: Option<UserRecord> = sqlx::query_as(
            "SELECT user_id, email, hashed_password FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Storage(e.to_string()))?;

        record.map(UserRecord::to_credentials).transpose()
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: String,
    email: String,
    hashed_password: String,
}

impl UserRecord {
    fn to_credentials(self) -> PortResult<UserCredentials> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| PortError::Storage(format!("corrupt user id: {e}")))?;
        Ok(UserCredentials {
            user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        })
    }
}

//=========================================================================================
// `SessionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionService for AuthSessionAdapter {
    async fn current_user_id(&self) -> Option<Uuid> {
        self.current.read().await.as_ref().map(|user| user.user_id)
    }

    async fn current_user(&self) -> Option<User> {
        self.current.read().await.clone()
    }

    /// Creates an account and signs it in. A taken email or a too-short
    /// password surface as opaque causes rather than enumerated subtypes.
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<User> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(PortError::Unexpected(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        // 1. Hash the password
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                PortError::Unexpected("failed to hash password".to_string())
            })?
            .to_string();

        // 2. Create the account
        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (user_id, email, hashed_password) VALUES (?, ?, ?)")
            .bind(user_id.to_string())
            .bind(email)
            .bind(&password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                    PortError::Unexpected("email is already registered".to_string())
                } else {
                    PortError::Storage(e.to_string())
                }
            })?;

        // 3. Sign the new account in
        let user = User {
            user_id,
            email: Some(email.to_string()),
        };
        *self.current.write().await = Some(user.clone());
        Ok(user)
    }

    /// Verifies the password and sets the ambient current user. Unknown
    /// email and wrong password are indistinguishable to the caller.
    async fn sign_in(&self, email: &str, password: &str) -> PortResult<User> {
        let Some(credentials) = self.credentials_by_email(email).await? else {
            return Err(PortError::Unauthorized);
        };

        let parsed_hash = PasswordHash::new(&credentials.hashed_password).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            PortError::Unexpected("authentication error".to_string())
        })?;

        let valid = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();
        if !valid {
            return Err(PortError::Unauthorized);
        }

        let user = User {
            user_id: credentials.user_id,
            email: Some(credentials.email),
        };
        *self.current.write().await = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> PortResult<()> {
        *self.current.write().await = None;
        Ok(())
    }
}
