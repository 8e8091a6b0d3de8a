//! Well-known mail providers.

use super::model::{DEFAULT_PORT, ServerConfig};
use serde::{Deserialize, Serialize};

/// Relay presets for common providers. All of them take STARTTLS on the
/// submission port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Gmail (`smtp.gmail.com`).
    Gmail,
    /// Outlook / Hotmail (`smtp.outlook.com`).
    Outlook,
    /// Yahoo Mail (`smtp.mail.yahoo.com`).
    Yahoo,
    /// Any other relay, by hostname.
    Custom(String),
}

impl Provider {
    /// Returns the relay hostname.
    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            Self::Gmail => "smtp.gmail.com",
            Self::Outlook => "smtp.outlook.com",
            Self::Yahoo => "smtp.mail.yahoo.com",
            Self::Custom(host) => host,
        }
    }

    /// Returns the server configuration for this provider.
    #[must_use]
    pub fn server(&self) -> ServerConfig {
        ServerConfig::new(self.host(), DEFAULT_PORT)
    }

    /// Picks a preset from the domain of an email address.
    #[must_use]
    pub fn detect(email: &str) -> Option<Self> {
        let (_, domain) = email.trim().rsplit_once('@')?;
        match domain.to_lowercase().as_str() {
            "gmail.com" | "googlemail.com" => Some(Self::Gmail),
            "outlook.com" | "hotmail.com" | "live.com" => Some(Self::Outlook),
            "yahoo.com" | "ymail.com" => Some(Self::Yahoo),
            _ => None,
        }
    }
}
