use thiserror::Error;

use crate::protocol::{Shortcut, User};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Short link code must not be blank.")]
    EmptyCode,
    #[error("Short link code must not contain spaces.")]
    CodeContainsWhitespace,
    #[error("Target URL must begin with 'http://' or 'https://' prefix.")]
    InvalidTargetUrl,
    #[error("Name must not be blank!")]
    EmptyName,
    #[error("Email must not be blank!")]
    EmptyEmail,
}

/// Client-side checks run before a record is submitted. The server applies
/// its own rules on top of these.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for Shortcut {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        if self.code.chars().any(char::is_whitespace) {
            return Err(ValidationError::CodeContainsWhitespace);
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ValidationError::InvalidTargetUrl);
        }
        Ok(())
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.email.is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        Ok(())
    }
}
