//! Send request validation.

use super::model::SendRequest;

/// A problem with a send request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Sender address is empty.
    EmptySender,
    /// Sender address format is invalid.
    InvalidSender,
    /// App password is empty.
    EmptyPassword,
    /// Recipient address is empty.
    EmptyRecipient,
    /// Recipient address format is invalid.
    InvalidRecipient,
    /// Subject is empty.
    EmptySubject,
    /// Body is empty.
    EmptyBody,
    /// SMTP host is empty.
    EmptySmtpHost,
    /// SMTP port is invalid.
    InvalidSmtpPort,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptySender => "Your email is required",
            Self::InvalidSender => "Your email address format is invalid",
            Self::EmptyPassword => "App password is required",
            Self::EmptyRecipient => "Recipient is required",
            Self::InvalidRecipient => "Recipient address format is invalid",
            Self::EmptySubject => "Subject is required",
            Self::EmptyBody => "Message body is required",
            Self::EmptySmtpHost => "SMTP server is required",
            Self::InvalidSmtpPort => "SMTP port must be 1-65535",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptySender | Self::InvalidSender => "from",
            Self::EmptyPassword => "password",
            Self::EmptyRecipient | Self::InvalidRecipient => "to",
            Self::EmptySubject => "subject",
            Self::EmptyBody => "body",
            Self::EmptySmtpHost => "host",
            Self::InvalidSmtpPort => "port",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating a request.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate a send request.
///
/// Returns `Ok(())` if valid, or every problem found.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_request(request: &SendRequest) -> ValidationResult {
    let mut errors = Vec::new();

    if request.sender.trim().is_empty() {
        errors.push(ValidationError::EmptySender);
    } else if !is_valid_email(&request.sender) {
        errors.push(ValidationError::InvalidSender);
    }

    if request.password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    }

    if request.recipient.trim().is_empty() {
        errors.push(ValidationError::EmptyRecipient);
    } else if !is_valid_email(&request.recipient) {
        errors.push(ValidationError::InvalidRecipient);
    }

    if request.subject.is_empty() {
        errors.push(ValidationError::EmptySubject);
    }
    if request.body.is_empty() {
        errors.push(ValidationError::EmptyBody);
    }

    if request.server.host.trim().is_empty() {
        errors.push(ValidationError::EmptySmtpHost);
    }
    if request.server.port == 0 {
        errors.push(ValidationError::InvalidSmtpPort);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return false;
    }

    // Domain must contain at least one dot and no empty labels
    domain.contains('.') && domain.split('.').all(|p| !p.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user.name@example.com"));
        assert!(is_valid_email("a@x.com"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("us er@example.com"));
    }

    #[test]
    fn test_validate_empty_request_reports_everything() {
        let request = SendRequest::new("", "", "", "", "")
            .with_server(ServerConfig::new("", 0));
        let errors = validate_request(&request).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptySender,
                ValidationError::EmptyPassword,
                ValidationError::EmptyRecipient,
                ValidationError::EmptySubject,
                ValidationError::EmptyBody,
                ValidationError::EmptySmtpHost,
                ValidationError::InvalidSmtpPort,
            ]
        );
    }

    #[test]
    fn test_validate_bad_addresses() {
        let request = SendRequest::new("me", "pw", "you@host", "Hi", "Hello");
        let errors = validate_request(&request).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidSender, ValidationError::InvalidRecipient]
        );
        assert_eq!(errors[0].field(), "from");
    }

    #[test]
    fn test_whitespace_subject_and_body_count_as_filled() {
        let request = SendRequest::new("a@x.com", "pw", "b@y.com", " ", "\n");
        assert!(validate_request(&request).is_ok());
    }

    #[test]
    fn test_validate_complete_request() {
        let request = SendRequest::new("a@x.com", "pw", "b@y.com", "Hi", "Hello\nWorld");
        assert!(validate_request(&request).is_ok());
    }
}
