//! Authentication and profile service.
//!
//! Successful login and registration write the session store as a side
//! effect; a successful profile edit refreshes the stored user snapshot.
//! An HTTP 403 from the auth endpoints means the account is blocked, which
//! gets its own error so forms can render the distinct message.

use serde::Deserialize;
use tracing::instrument;

use crate::api::{ApiClient, ApiError};
use crate::models::{NewAccount, PersonalInfo, User};

/// Response payload of `/auth/login` and `/auth/register`.
#[derive(Debug, Deserialize)]
struct AuthPayload {
    token: String,
    user: User,
}

/// Authentication and profile operations.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub(crate) const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in with email and password.
    ///
    /// On success the token and user snapshot are written to the session
    /// store before this returns.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::AccountBlocked` on HTTP 403, a `Backend` error on
    /// bad credentials, or a transport error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });

        let payload: AuthPayload = self
            .client
            .post_json("/auth/login", &body)
            .await
            .map_err(blocked_on_forbidden)?;

        self.client
            .session()
            .set_auth(&payload.token, &payload.user)?;

        Ok(payload.user)
    }

    /// Create an account and log in.
    ///
    /// On success the token and user snapshot are written to the session
    /// store before this returns.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::AccountBlocked` on HTTP 403, a `Backend` error on
    /// validation failure (e.g. email already registered), or a transport
    /// error.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(&self, account: &NewAccount) -> Result<User, ApiError> {
        let payload: AuthPayload = self
            .client
            .post_json("/auth/register", account)
            .await
            .map_err(blocked_on_forbidden)?;

        self.client
            .session()
            .set_auth(&payload.token, &payload.user)?;

        Ok(payload.user)
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the session is invalid (the
    /// session store is cleared as a side effect), or a transport error.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User, ApiError> {
        self.client.get("/user/profile").await
    }

    /// Update the authenticated user's profile.
    ///
    /// On success the session's user snapshot is refreshed.
    ///
    /// # Errors
    ///
    /// Returns a `Backend` error on validation failure, `Unauthorized` on
    /// an invalid session, or a transport error.
    #[instrument(skip(self, info))]
    pub async fn update_profile(&self, info: &PersonalInfo) -> Result<User, ApiError> {
        let form = reqwest::multipart::Form::new()
            .text("first_name", info.first_name.clone())
            .text("last_name", info.last_name.clone())
            .text("email", info.email.clone())
            .text("phone_number", info.phone.clone());

        let user: User = self.client.post_multipart("/user/edit", form).await?;

        self.client.session().update_user(&user)?;

        Ok(user)
    }

    /// Drop the local session. Purely client-side; the backend keeps no
    /// session state beyond the token itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be written.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<(), ApiError> {
        self.client.session().clear_auth()?;
        self.client.session().clear_order_draft()?;
        Ok(())
    }
}

/// Auth endpoints answer 403 for blocked accounts.
fn blocked_on_forbidden(err: ApiError) -> ApiError {
    match err {
        ApiError::Forbidden => ApiError::AccountBlocked,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_on_forbidden_maps_only_403() {
        assert!(matches!(
            blocked_on_forbidden(ApiError::Forbidden),
            ApiError::AccountBlocked
        ));
        assert!(matches!(
            blocked_on_forbidden(ApiError::Unauthorized),
            ApiError::Unauthorized
        ));
    }
}
