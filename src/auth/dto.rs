use serde::{Deserialize, Serialize};

use super::repo_types::User;

/// Only the discriminator; the rest of the body is decoded per action.
#[derive(Debug, Deserialize)]
pub struct ActionEnvelope {
    pub action: Option<String>,
}

/// Request body for `action = "register"`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_seller: Option<bool>,
}

/// Request body for `action = "login"`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub is_seller: bool,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            is_seller: u.is_seller,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// Treats `None` and `""` alike.
pub(crate) fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}
