use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use messenger_config::AuthConfig;
use messenger_database::{
    Constraint, CreateSessionRequest, CreateUserRequest, DatabaseError, SessionRepository,
    UpdateUserRequest, User, UserRepository,
};
use rand::RngCore;
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};

pub mod validation;

/// Upper bound on session lifetime (100 years) so expiry arithmetic cannot overflow.
const MAX_SESSION_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Authenticator {
    users: UserRepository,
    sessions: SessionRepository,
    session_ttl: Duration,
    min_password_length: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("a user with this phone number already exists")]
    UserExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
}

impl AuthError {
    fn from_write(error: DatabaseError) -> Self {
        match error.conflict() {
            Some(Constraint::PhoneNumber) => Self::UserExists,
            _ => Self::Database(error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Fields accepted when creating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub phone_number: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

/// Partial profile update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `YYYY-MM-DD`; a blank string clears the stored date.
    pub date_of_birth: Option<String>,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: AuthConfig) -> Self {
        let ttl_seconds = config.session_ttl_seconds.min(MAX_SESSION_TTL_SECONDS) as i64;
        let session_ttl = Duration::seconds(ttl_seconds);

        Self {
            users: UserRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool),
            session_ttl,
            min_password_length: config.min_password_length,
        }
    }

    /// Create an account and open its first session.
    pub async fn register(&self, registration: &Registration) -> Result<(User, AuthSession), AuthError> {
        let phone_number = registration.phone_number.trim();
        let first_name = registration.first_name.trim();
        let last_name = registration.last_name.trim();

        validation::validate_phone_number(phone_number)?;
        validation::validate_first_name(first_name)?;
        validation::validate_last_name(last_name)?;
        validation::validate_password(&registration.password, self.min_password_length)?;

        if self.users.find_by_phone_number(phone_number).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let password_hash = hash_password(&registration.password)?;
        let user = self
            .users
            .create(&CreateUserRequest {
                phone_number: phone_number.to_owned(),
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                password_hash,
            })
            .await
            .map_err(AuthError::from_write)?;

        info!(user_id = user.id, "registered user");
        let session = self.issue_session(user.id).await?;
        Ok((user, session))
    }

    pub async fn login(&self, phone_number: &str, password: &str) -> Result<AuthSession, AuthError> {
        let Some(credentials) = self.users.find_credentials(phone_number.trim()).await? else {
            debug!("login attempt for unknown phone number");
            return Err(AuthError::InvalidCredentials);
        };

        let stored_hash = PasswordHash::new(&credentials.password_hash)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &stored_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        info!(user_id = credentials.user.id, "user logged in");
        self.issue_session(credentials.user.id).await
    }

    /// Resolve a bearer token to its user. Expired sessions are deleted on sight.
    pub async fn authenticate_token(&self, token: &str) -> Result<(User, AuthSession), AuthError> {
        let Some(session) = self.sessions.find_by_token(token).await? else {
            return Err(AuthError::SessionNotFound);
        };

        let expires_at = DateTime::parse_from_rfc3339(&session.expires_at)
            .map_err(|_| AuthError::InvalidSession)?
            .with_timezone(&Utc);

        if expires_at <= Utc::now() {
            self.sessions.delete(token).await?;
            return Err(AuthError::SessionExpired);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::InvalidSession)?;

        Ok((
            user,
            AuthSession {
                token: session.token,
                user_id: session.user_id,
                expires_at,
            },
        ))
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete(token).await?;
        Ok(())
    }

    pub async fn user_profile(&self, user_id: i64) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<User, AuthError> {
        let phone_number = update.phone_number.as_deref().map(str::trim);
        let first_name = update.first_name.as_deref().map(str::trim);
        let last_name = update.last_name.as_deref().map(str::trim);

        if let Some(phone_number) = phone_number {
            validation::validate_phone_number(phone_number)?;
            if let Some(owner) = self.users.find_by_phone_number(phone_number).await? {
                if owner.id != user_id {
                    return Err(AuthError::UserExists);
                }
            }
        }
        if let Some(first_name) = first_name {
            validation::validate_first_name(first_name)?;
        }
        if let Some(last_name) = last_name {
            validation::validate_last_name(last_name)?;
        }
        let date_of_birth = match update.date_of_birth.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(date) => Some(Some(validation::normalize_date_of_birth(date)?)),
        };

        let request = UpdateUserRequest {
            phone_number: phone_number.map(str::to_owned),
            first_name: first_name.map(str::to_owned),
            last_name: last_name.map(str::to_owned),
            date_of_birth,
        };

        let user = self.users.update(user_id, &request).await.map_err(|error| match error {
            DatabaseError::NotFound(_) => AuthError::UserNotFound,
            other => AuthError::from_write(other),
        })?;

        info!(user_id, "updated profile");
        Ok(user)
    }

    /// Users whose phone number or first name contains `query`. A blank query matches nobody.
    pub async fn search_users(&self, requester_id: i64, query: &str) -> Result<Vec<User>, AuthError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.users.search(query, requester_id).await?)
    }

    async fn issue_session(&self, user_id: i64) -> Result<AuthSession, AuthError> {
        let token = generate_session_token();
        let expires_at = Utc::now()
            .checked_add_signed(self.session_ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.sessions
            .create(&CreateSessionRequest {
                user_id,
                token: token.clone(),
                expires_at: expires_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            })
            .await?;

        Ok(AuthSession {
            token,
            user_id,
            expires_at,
        })
    }
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
