use thiserror::Error;

use super::errors::WeakPassword;

/// Characters accepted by the special-character rule.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\"{}|<>/[]\\`~;:'-_=+";

/// A single strength rule a password failed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PolicyViolation {
    #[error("Minimum password length should be {min}.")]
    TooShort { min: usize },

    #[error("Password should contain at least one lowercase letter, one uppercase letter, and one digit.")]
    MissingCharacterClasses,

    #[error("Password should contain at least one special character.")]
    MissingSpecialCharacter,
}

/// Strength policy applied before a password is hashed for storage.
///
/// Every rule is evaluated so the caller gets the full list of problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl PasswordPolicy {
    pub const DEFAULT_MIN_LENGTH: usize = 8;

    pub fn new() -> Self {
        Self {
            min_length: Self::DEFAULT_MIN_LENGTH,
        }
    }

    pub fn with_min_length(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Check a plaintext password against all rules.
    ///
    /// # Arguments
    /// * `password` - Candidate plaintext password
    ///
    /// # Errors
    /// * `WeakPassword` - One or more rules failed, all of them listed
    pub fn check(&self, password: &str) -> Result<(), WeakPassword> {
        let mut violations = Vec::new();

        if password.chars().count() < self.min_length {
            violations.push(PolicyViolation::TooShort {
                min: self.min_length,
            });
        }

        let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
        let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !(has_lowercase && has_uppercase && has_digit) {
            violations.push(PolicyViolation::MissingCharacterClasses);
        }

        if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            violations.push(PolicyViolation::MissingSpecialCharacter);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(WeakPassword { violations })
        }
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new()
    }
}
