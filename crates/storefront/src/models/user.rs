//! User and profile types.

use serde::{Deserialize, Serialize};

use fernway_core::{Email, UserId};

/// The authenticated shopper, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User's backend ID.
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
}

impl User {
    /// Full display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Editable profile fields, submitted to `/user/edit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&User> for PersonalInfo {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.as_str().to_owned(),
            phone: user.phone.clone(),
        }
    }
}

/// Registration payload for `/auth/register`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}
