//! Camera credentials
//!
//! ## Security Policy
//!
//! - The secret is held in a zeroizing buffer and wiped on drop
//! - `Debug` never prints the secret
//! - The only place the secret leaves this type is the capture argument list

use std::env;
use std::fmt;

use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Environment variable holding the camera user name
pub const USER_ENV_VAR: &str = "mobotuser";

/// Environment variable holding the camera password
pub const SECRET_ENV_VAR: &str = "mobotpassword";

/// Marker substituted for the secret wherever it would otherwise be logged
pub const REDACTED: &str = "********";

/// Camera user name and password
#[derive(Clone)]
pub struct Credentials {
    user: String,
    secret: Zeroizing<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Read credentials from `mobotuser` / `mobotpassword`
    ///
    /// Both variables must be present and non-empty.
    pub fn from_env() -> Result<Self> {
        let user = read_var(USER_ENV_VAR)?;
        let secret = Zeroizing::new(read_var(SECRET_ENV_VAR)?);
        Ok(Self { user, secret })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Expose the secret. Callers must not log the returned value.
    pub fn expose_secret(&self) -> &str {
        self.secret.as_str()
    }

    /// Replace every occurrence of the secret in `text` with [`REDACTED`]
    pub fn redact(&self, text: &str) -> String {
        if self.secret.is_empty() {
            return text.to_string();
        }
        text.replace(self.secret.as_str(), REDACTED)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &REDACTED)
            .finish()
    }
}

fn read_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::MissingCredential {
            var: name.to_string(),
        }),
    }
}
