//! User entity definitions

use serde::{Deserialize, Serialize};

/// A registered account. The password hash is never part of this type.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`, when the user has set one.
    pub date_of_birth: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Label shown in like lists: the first name, or the phone number when it is blank.
    pub fn display_label(&self) -> &str {
        if self.first_name.trim().is_empty() {
            &self.phone_number
        } else {
            &self.first_name
        }
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// A user row together with its stored password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Request for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Request for updating an existing user; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `Some(None)` clears the stored date.
    pub date_of_birth: Option<Option<String>>,
}
