//! Envelope address type.

use crate::error::{Error, Result};

/// Email address as used in `MAIL FROM` and `RCPT TO`.
///
/// Only the checks needed to keep the envelope line well-formed are applied;
/// whether the mailbox exists is the server's call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into().trim().to_string();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "{addr:?} contains whitespace, control characters or angle brackets"
            )));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("{addr:?} must contain @")));
        };

        if domain.contains('@') {
            return Err(Error::InvalidAddress(format!(
                "{addr:?} must have exactly one @"
            )));
        }

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "{addr:?} has an empty local or domain part"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.domain(), "example.com");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let addr: Address = "  a@x.com \n".parse().unwrap();
        assert_eq!(addr.as_str(), "a@x.com");
    }

    #[test]
    fn rejects_missing_at() {
        assert!(Address::new("userexample.com").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert!(Address::new("").is_err());
        assert!(Address::new("   ").is_err());
    }

    #[test]
    fn rejects_empty_parts() {
        assert!(Address::new("@example.com").is_err());
        assert!(Address::new("user@").is_err());
    }

    #[test]
    fn rejects_two_ats() {
        assert!(Address::new("a@b@c").is_err());
    }

    #[test]
    fn rejects_envelope_breaking_characters() {
        assert!(Address::new("a@x.com>\r\nRCPT TO:<b@y.com").is_err());
        assert!(Address::new("first last@x.com").is_err());
    }
}
