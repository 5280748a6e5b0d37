//! Credential sources for the login helper.
//!
//! Passwords are held in [`Zeroizing`] buffers and never written back to the
//! process environment. The default provider consults `IG_PASSWORD_<username>`
//! first, prompts otherwise, and remembers the answer for its own lifetime.

use crate::error::CredentialError;
use std::collections::HashMap;
use zeroize::Zeroizing;

pub type Secret = Zeroizing<String>;

/// Supplies the password and second-factor code needed to log in.
pub trait CredentialProvider {
    fn password(&mut self, username: &str) -> Result<Secret, CredentialError>;

    fn verification_code(&mut self) -> Result<Secret, CredentialError>;
}

/// Reads input from the terminal without echo.
pub trait SecretPrompt {
    fn read_secret(&mut self, prompt: &str) -> Result<String, dialoguer::Error>;
}

pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn read_secret(&mut self, prompt: &str) -> Result<String, dialoguer::Error> {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
    }
}

/// Name of the environment variable consulted for `username`'s password.
pub fn password_env_var(username: &str) -> String {
    format!("IG_PASSWORD_{}", username)
}

/// Environment first, then the prompt, with an in-memory cache.
pub struct EnvOrPrompt<P = TerminalPrompt> {
    prompt: P,
    env: fn(&str) -> Option<String>,
    cache: HashMap<String, Secret>,
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl EnvOrPrompt<TerminalPrompt> {
    pub fn new() -> Self {
        Self::with_prompt(TerminalPrompt)
    }
}

impl Default for EnvOrPrompt<TerminalPrompt> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SecretPrompt> EnvOrPrompt<P> {
    pub fn with_prompt(prompt: P) -> Self {
        Self {
            prompt,
            env: read_env,
            cache: HashMap::new(),
        }
    }

    /// Replace the environment lookup.
    pub fn with_env(mut self, env: fn(&str) -> Option<String>) -> Self {
        self.env = env;
        self
    }

    fn ask(&mut self, what: &'static str, prompt: &str) -> Result<Secret, CredentialError> {
        let answer = Zeroizing::new(
            self.prompt
                .read_secret(prompt)
                .map_err(|source| CredentialError::Prompt { what, source })?,
        );
        if answer.trim().is_empty() {
            return Err(CredentialError::Empty(what));
        }
        Ok(answer)
    }
}

impl<P: SecretPrompt> CredentialProvider for EnvOrPrompt<P> {
    fn password(&mut self, username: &str) -> Result<Secret, CredentialError> {
        if let Some(cached) = self.cache.get(username) {
            tracing::debug!(username, "Using cached password");
            return Ok(cached.clone());
        }

        let key = password_env_var(username);
        if let Some(value) = (self.env)(&key).filter(|v| !v.is_empty()) {
            tracing::info!("Using environment variable {}", key);
            return Ok(Zeroizing::new(value));
        }

        let password = self.ask("password", "Password")?;
        self.cache.insert(username.to_string(), password.clone());
        Ok(password)
    }

    fn verification_code(&mut self) -> Result<Secret, CredentialError> {
        self.ask("verification code", "2FA code")
    }
}

/// Fixed credentials, for non-interactive runs.
pub struct StaticCredentials {
    password: Secret,
    verification_code: Option<Secret>,
}

impl StaticCredentials {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Zeroizing::new(password.into()),
            verification_code: None,
        }
    }

    pub fn with_verification_code(mut self, code: impl Into<String>) -> Self {
        self.verification_code = Some(Zeroizing::new(code.into()));
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn password(&mut self, _username: &str) -> Result<Secret, CredentialError> {
        Ok(self.password.clone())
    }

    fn verification_code(&mut self) -> Result<Secret, CredentialError> {
        self.verification_code
            .clone()
            .ok_or(CredentialError::Empty("verification code"))
    }
}
