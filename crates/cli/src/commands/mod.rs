//! CLI command implementations.

pub mod account;
pub mod catalog;
pub mod checkout;

use thiserror::Error;

use fernway_storefront::api::ApiError;
use fernway_storefront::config::ConfigError;
use fernway_storefront::session::SessionError;

/// Errors a CLI command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration is missing or invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The session store could not be opened or written.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// A backend call failed.
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    /// The checkout wizard stopped with a form error.
    #[error("{0}")]
    Checkout(String),

    /// Arguments don't make sense for the store's data.
    #[error("{0}")]
    InvalidInput(String),
}
