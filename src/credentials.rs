//! Login credentials for the portal.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Username and password for the login form.
///
/// The password sits behind [`SecretString`] so it is redacted from debug
/// output and zeroized on drop. Credentials are never persisted by this
/// crate; they exist only long enough to fill the login POST.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Clear-text password, exposed only while the login fields are built.
    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
