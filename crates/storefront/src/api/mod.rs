//! The configured HTTP client every domain service goes through.
//!
//! One `reqwest::Client` per process: fixed base URL, 10 second timeout,
//! JSON content negotiation. Each request gets the session's bearer token
//! (when present) and a fresh `x-request-id` for correlation. A 401
//! response clears the session store before the error surfaces - the
//! logout-on-unauthorized policy lives here so no service can forget it.
//!
//! There are no retries, no backoff, and no circuit breaking: one attempt
//! per call, failure surfaces immediately to the caller.

mod envelope;

pub use envelope::Envelope;

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::StorefrontConfig;
use crate::session::SessionStore;

/// The HTTP header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Unified failure type for every backend interaction.
///
/// Every domain service returns `Result<_, ApiError>`; there is exactly one
/// failure taxonomy across the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a usable response (DNS, connect,
    /// timeout, TLS).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not a well-formed envelope.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend answered with a business-level failure envelope.
    #[error("{message}")]
    Backend {
        code: u16,
        message: String,
        errors: Vec<String>,
    },

    /// HTTP 401. The session store has already been cleared.
    #[error("session expired")]
    Unauthorized,

    /// HTTP 403.
    #[error("access denied")]
    Forbidden,

    /// HTTP 403 from an authentication endpoint.
    #[error("account blocked")]
    AccountBlocked,

    /// A success envelope with no payload where one was required.
    #[error("response envelope had no data")]
    EmptyData,

    /// A service side effect (writing the session store) failed.
    #[error("session persistence failed: {0}")]
    Session(#[from] crate::session::SessionError),
}

impl ApiError {
    /// The text a form or terminal renders for this failure.
    ///
    /// Backend messages pass through; transport and decode failures fall
    /// back to a generic retryable message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message, errors, .. } => {
                if !message.is_empty() {
                    message.clone()
                } else if let Some(first) = errors.first() {
                    first.clone()
                } else {
                    GENERIC_FAILURE.to_owned()
                }
            }
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_owned(),
            Self::AccountBlocked => {
                "This account has been blocked. Contact support for help.".to_owned()
            }
            Self::Forbidden => "You don't have permission to do that.".to_owned(),
            Self::Transport(_) | Self::Decode(_) | Self::EmptyData | Self::Session(_) => {
                GENERIC_FAILURE.to_owned()
            }
        }
    }
}

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// The configured HTTP client. Cheaply cloneable.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    /// Build the client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &StorefrontConfig, session: SessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
                session,
            }),
        })
    }

    /// The session store this client clears on 401.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    /// GET `path` and unwrap the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success envelope, or an
    /// authorization failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.inner.http.get(self.url(path));
        self.execute::<T>(path, request).await?.into_result()
    }

    /// GET `path`, checking only the envelope's business code.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success envelope, or an
    /// authorization failure.
    pub async fn get_ack(&self, path: &str) -> Result<(), ApiError> {
        let request = self.inner.http.get(self.url(path));
        self.execute::<serde_json::Value>(path, request)
            .await?
            .into_ack()
    }

    /// POST a JSON body to `path` and unwrap the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success envelope, or an
    /// authorization failure.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.inner.http.post(self.url(path)).json(body);
        self.execute::<T>(path, request).await?.into_result()
    }

    /// POST a multipart form to `path` and unwrap the envelope.
    ///
    /// Several legacy endpoints (`/user/edit`, the `/shipping` group,
    /// `/freshorder/create`) accept multipart forms rather than JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success envelope, or an
    /// authorization failure.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let request = self.inner.http.post(self.url(path)).multipart(form);
        self.execute::<T>(path, request).await?.into_result()
    }

    // =========================================================================
    // Execution
    // =========================================================================

    #[instrument(skip(self, request), fields(path = %path, request_id))]
    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        mut request: reqwest::RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        request = request
            .header(REQUEST_ID_HEADER, &request_id)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = self.inner.session.token() {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            debug!("401 from backend, clearing session");
            if let Err(e) = self.inner.session.clear_auth() {
                tracing::warn!(error = %e, "failed to clear session after 401");
            }
            return Err(ApiError::Unauthorized);
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::Forbidden);
        }

        let body = response.text().await?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => {
                // Non-envelope error body (proxy page, plain text).
                Err(ApiError::Backend {
                    code: status.as_u16(),
                    message: format!("HTTP {status}"),
                    errors: vec![body.chars().take(200).collect()],
                })
            }
            Err(e) => Err(ApiError::Decode(e)),
        }
    }
}
