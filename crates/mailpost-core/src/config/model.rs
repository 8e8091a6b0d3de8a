//! Server configuration model types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relay used when none is given.
pub const DEFAULT_HOST: &str = "smtp.gmail.com";

/// Submission port used when none is given.
pub const DEFAULT_PORT: u16 = 587;

/// Security/encryption mode for the relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// Plaintext connect upgraded with STARTTLS.
    #[default]
    StartTls,
    /// Implicit TLS (connect directly with TLS, usually port 465).
    Tls,
    /// No encryption. Only for local test relays.
    None,
}

impl Security {
    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::StartTls => "STARTTLS",
            Self::Tls => "SSL/TLS",
            Self::None => "None (insecure)",
        }
    }

    /// Get the conventional port for the security mode.
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::StartTls => DEFAULT_PORT,
            Self::Tls => 465,
            Self::None => 25,
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Where to deliver a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
}

impl ServerConfig {
    /// Creates a STARTTLS configuration for `host:port`.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            security: Security::StartTls,
        }
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn with_security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// SMTP AUTH credentials: the sender address and its (app) password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username, normally the sender address.
    pub username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the password.
    #[must_use]
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "smtp.gmail.com");
        assert_eq!(server.port, 587);
        assert_eq!(server.security, Security::StartTls);
    }

    #[test]
    fn test_server_config_deserializes_with_defaults() {
        let server: ServerConfig = serde_json::from_str(r#"{"port": 2525}"#).unwrap();
        assert_eq!(server.host, DEFAULT_HOST);
        assert_eq!(server.port, 2525);

        let server: ServerConfig =
            serde_json::from_str(r#"{"host": "localhost", "security": "none"}"#).unwrap();
        assert_eq!(server.security, Security::None);
    }

    #[test]
    fn test_security_ports() {
        assert_eq!(Security::StartTls.default_port(), 587);
        assert_eq!(Security::Tls.default_port(), 465);
        assert_eq!(Security::None.to_string(), "None (insecure)");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("a@x.com", "abcd efgh ijkl mnop");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("a@x.com"));
        assert!(!debug.contains("abcd"));
        assert_eq!(credentials.password(), "abcd efgh ijkl mnop");
    }
}
