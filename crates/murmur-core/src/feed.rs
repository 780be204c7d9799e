//! # Feed Identifiers
//!
//! Posts and comments are keyed by database-assigned 32-bit integers.
//! Path parameters arrive as strings and go through [`PostId::parse_param`]
//! or [`CommentId::parse_param`], which produce the client-facing
//! `'<param>' is not a number` error on failure.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub i32);

impl PostId {
    /// Parse a raw path segment; `field` is the wire name used in the error.
    pub fn parse_param(raw: &str, field: &'static str) -> Result<Self, ValidationError> {
        parse_i32(raw, field).map(Self)
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub i32);

impl CommentId {
    /// Parse a raw path segment; `field` is the wire name used in the error.
    pub fn parse_param(raw: &str, field: &'static str) -> Result<Self, ValidationError> {
        parse_i32(raw, field).map(Self)
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_i32(raw: &str, field: &'static str) -> Result<i32, ValidationError> {
    raw.parse::<i32>()
        .map_err(|_| ValidationError::NotANumber { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_ids() {
        assert_eq!(PostId::parse_param("42", "postId").unwrap(), PostId(42));
        assert_eq!(
            CommentId::parse_param("7", "commentId").unwrap(),
            CommentId(7)
        );
    }

    #[test]
    fn non_numeric_id_names_the_parameter() {
        let err = PostId::parse_param("abc", "postId").unwrap_err();
        assert_eq!(err.to_string(), "'postId' is not a number");

        let err = CommentId::parse_param("1.5", "commentId").unwrap_err();
        assert_eq!(err.to_string(), "'commentId' is not a number");
    }

    #[test]
    fn out_of_range_id_is_not_a_number() {
        assert!(PostId::parse_param("99999999999", "postId").is_err());
    }
}
