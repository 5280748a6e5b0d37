//! Giveaway winner selection and engagement insights for a social media
//! account, over the platform's private API.

pub mod config;
pub mod credentials;
pub mod error;
pub mod giveaway;
pub mod insights;
pub mod platform;
pub mod session;

pub use error::{
    ConfigError, CredentialError, GiveawayError, InsightsError, PlatformError, SessionError,
};
