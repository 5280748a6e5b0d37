//! Error types for gramkit
//!
//! Library code returns these typed errors; the binary wraps them in
//! `anyhow` with context before reporting.

use thiserror::Error;

/// Errors raised by a [`crate::platform::Platform`] implementation.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The session is not authenticated
    #[error("Login required")]
    LoginRequired,

    /// Login answered with a second-factor challenge and no code was supplied
    #[error("Two-factor verification code required")]
    TwoFactorRequired,

    /// An operation needed the logged-in account but there is no session
    #[error("No active session")]
    NoSession,

    /// The post URL does not carry a decodable shortcode
    #[error("Invalid media URL: {0}")]
    InvalidMediaUrl(String),

    /// The platform answered with a non-success status
    #[error("Platform API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A response could not be mapped onto a typed record
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    /// Transport-level failure
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while obtaining credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read {what} from terminal: {source}")]
    Prompt {
        what: &'static str,
        #[source]
        source: dialoguer::Error,
    },

    #[error("Empty {0} supplied")]
    Empty(&'static str),
}

/// Errors raised by the login helper.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Errors raised by the giveaway pipeline.
#[derive(Debug, Error)]
pub enum GiveawayError {
    /// Nobody both follows the account and liked the post
    #[error("No eligible entries to draw a winner from")]
    NoEligibleEntries,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Errors raised by the insights pipeline.
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("Comment share must be within [0, 1], got {0}")]
    InvalidCommentShare(f64),

    #[error("Account {0} has no followers; engagement rate is undefined")]
    NoFollowers(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
