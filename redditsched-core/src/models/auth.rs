//! Authentication payloads.

use serde::{Deserialize, Serialize};

/// Login request body. Either `username` or `email` identifies the user.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct LoginCredentials {
    /// Username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Password.
    pub password: String,
}

impl LoginCredentials {
    /// Credentials identified by username.
    pub fn with_username(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            email: None,
            password: password.into(),
        }
    }

    /// Credentials identified by email.
    pub fn with_email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: None,
            email: Some(email.into()),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Login response: a fresh credential pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Access token.
    pub access: String,
    /// Refresh token.
    pub refresh: String,
}

/// Signup request body.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct SignupData {
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password confirmation, must equal `password`.
    pub password_confirm: String,
    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl SignupData {
    /// Returns true if the password and its confirmation match.
    pub fn passwords_match(&self) -> bool {
        self.password == self.password_confirm
    }
}

impl std::fmt::Debug for SignupData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupData")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

/// User details as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserDetails {
    /// Primary key.
    #[serde(default, alias = "pk")]
    pub id: Option<i64>,
    /// Username.
    pub username: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Whether at least one Reddit account is linked.
    #[serde(default)]
    pub is_reddit_linked: Option<bool>,
}

/// Signup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SignupResponse {
    /// The created user.
    #[serde(default)]
    pub user: Option<UserDetails>,
    /// Server message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Token refresh response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    /// New access token.
    pub access: String,
}

/// Result of verifying the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserResponse {
    /// Whether the access token verified.
    pub authenticated: bool,
    /// User info, when the dashboard could be loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDetails>,
}
