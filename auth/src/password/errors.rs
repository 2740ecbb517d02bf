use thiserror::Error;

use super::policy::PolicyViolation;

/// Error type for password verification.
///
/// Both variants mean the stored hash is corrupt; callers should treat them
/// as a failed verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Stored password hash is not valid base64: {0}")]
    Decoding(String),

    #[error("Stored password hash has invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Password rejected by the strength policy.
///
/// Carries every violated rule, in policy order.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", join_messages(.violations))]
pub struct WeakPassword {
    pub violations: Vec<PolicyViolation>,
}

impl WeakPassword {
    /// Human readable message for each violated rule.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }
}

fn join_messages(violations: &[PolicyViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
