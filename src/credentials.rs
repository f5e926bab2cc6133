//! Credential providers for the processor's basic authentication
//!
//! Credentials are looked up at call time and sent as an `Authorization`
//! header. They are never part of the request URL and never printed.

use crate::{EasypayError, Result};
use std::fmt;

/// Environment variable holding the API username
pub const USERNAME_ENV: &str = "EASYPAY_USERNAME";

/// Environment variable holding the API password
pub const PASSWORD_ENV: &str = "EASYPAY_PASSWORD";

/// Basic-auth credential pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Supplies auth material for each outbound call
pub trait CredentialProvider: Send + Sync {
    /// Current credentials, or `None` when the endpoint needs no auth
    fn credentials(&self) -> Result<Option<Credentials>>;
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Result<Option<Credentials>> + Send + Sync,
{
    fn credentials(&self) -> Result<Option<Credentials>> {
        self()
    }
}

/// Provider that never supplies credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn credentials(&self) -> Result<Option<Credentials>> {
        Ok(None)
    }
}

/// Fixed credentials handed over at startup
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Credentials::new(username, password))
    }
}

impl From<Credentials> for StaticCredentials {
    fn from(credentials: Credentials) -> Self {
        Self(credentials)
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Option<Credentials>> {
        Ok(Some(self.0.clone()))
    }
}

/// Reads `EASYPAY_USERNAME` / `EASYPAY_PASSWORD` on every call, so rotated
/// secrets are picked up without a restart
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    username_var: String,
    password_var: String,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::with_vars(USERNAME_ENV, PASSWORD_ENV)
    }

    /// Read from custom variable names
    pub fn with_vars(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            username_var: username_var.into(),
            password_var: password_var.into(),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<Option<Credentials>> {
        let username = std::env::var(&self.username_var).ok();
        let password = std::env::var(&self.password_var).ok();

        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Credentials::new(username, password))),
            (None, None) => Ok(None),
            (Some(_), None) => Err(EasypayError::credentials(format!(
                "{} is set but {} is missing",
                self.username_var, self.password_var
            ))),
            (None, Some(_)) => Err(EasypayError::credentials(format!(
                "{} is set but {} is missing",
                self.password_var, self.username_var
            ))),
        }
    }
}
