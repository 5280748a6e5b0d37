use crate::credentials::CredentialProvider;
use crate::error::{PlatformError, SessionError};
use crate::platform::{Platform, SessionUser};

#[derive(Debug, Clone, Copy)]
pub struct LoginOptions {
    pub two_factor: bool,
    /// Log in again even when the current session is valid
    pub refresh: bool,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            two_factor: true,
            refresh: false,
        }
    }
}

/// Whether the client already holds a valid session.
///
/// Only the platform's "login required" answer means "no"; any other
/// failure propagates.
pub async fn check_login_status(platform: &dyn Platform) -> Result<bool, PlatformError> {
    tracing::info!("Checking login status.");
    match platform.check_session().await {
        Ok(()) => Ok(true),
        Err(PlatformError::LoginRequired) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Log in unless the session is already valid (or `refresh` is set).
///
/// A valid session that cannot name its account is reported as
/// [`PlatformError::NoSession`] instead of being replaced by a fresh login.
pub async fn maybe_login(
    platform: &dyn Platform,
    username: &str,
    credentials: &mut dyn CredentialProvider,
    options: LoginOptions,
) -> Result<SessionUser, SessionError> {
    if check_login_status(platform).await? && !options.refresh {
        let user = platform.session_user().ok_or(PlatformError::NoSession)?;
        tracing::info!("Already logged in.");
        return Ok(user);
    }

    tracing::info!("Logging into {}.", username);

    let password = credentials.password(username)?;
    let code = if options.two_factor {
        Some(credentials.verification_code()?)
    } else {
        None
    };

    let user = platform
        .login(username, &password, code.as_ref().map(|c| c.as_str()))
        .await?;
    tracing::info!(user_id = %user.user_id, "Logged in as {}", user.username);
    Ok(user)
}
