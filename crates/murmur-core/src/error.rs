//! # Validation Errors
//!
//! Failures raised while turning untrusted client input into domain values.
//! The `Display` output of each variant is the exact message returned to the
//! client in the error envelope, so wording changes are wire changes.

use thiserror::Error;

/// Client input that failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A numeric parameter (query or path) did not parse as an integer.
    #[error("'{field}' is not a number")]
    NotANumber {
        /// Wire name of the offending parameter.
        field: &'static str,
    },

    /// The pagination offset was negative.
    #[error("'offset' must not be negative")]
    NegativeOffset(i64),

    /// A required text field was empty.
    #[error("'{field}' is empty")]
    Empty {
        /// Wire name of the empty field.
        field: &'static str,
    },

    /// A string did not parse as an identity identifier.
    #[error("invalid identity identifier: {0}")]
    InvalidIdentityId(String),

    /// A string did not parse as an IP address.
    #[error("invalid network origin: {0}")]
    InvalidOrigin(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_number_names_the_field() {
        let err = ValidationError::NotANumber { field: "postId" };
        assert_eq!(err.to_string(), "'postId' is not a number");
    }

    #[test]
    fn empty_names_the_field() {
        let err = ValidationError::Empty { field: "content" };
        assert_eq!(err.to_string(), "'content' is empty");
    }

    #[test]
    fn negative_offset_message_is_stable() {
        assert_eq!(
            ValidationError::NegativeOffset(-3).to_string(),
            "'offset' must not be negative"
        );
    }
}
