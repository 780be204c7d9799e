//! # Request Extraction & Validation
//!
//! Helpers that turn axum's extractor rejections into [`AppError`] so every
//! malformed input reaches the client through the standard error envelope,
//! plus the [`Validate`] trait for request bodies and the shared list
//! query.

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::Query;
use murmur_core::{PaginationPlan, ValidationError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppError;

/// Client message for any body that fails to parse.
pub const INVALID_BODY: &str = "Body is invalid";

/// Business rules a request body must satisfy beyond deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Decode a JSON body, mapping any failure to `400 Body is invalid`.
///
/// The declared `Content-Type` is not checked: browser clients posting a
/// stringified body send `text/plain`.
pub fn extract_json<T: DeserializeOwned>(
    result: Result<Bytes, BytesRejection>,
) -> Result<T, AppError> {
    let bytes = result.map_err(|_| AppError::BadRequest(INVALID_BODY.into()))?;
    serde_json::from_slice(&bytes).map_err(|_| AppError::BadRequest(INVALID_BODY.into()))
}

/// Decode a JSON body and run its [`Validate`] rules.
pub fn extract_validated_json<T: DeserializeOwned + Validate>(
    result: Result<Bytes, BytesRejection>,
) -> Result<T, AppError> {
    let value: T = extract_json(result)?;
    value.validate()?;
    Ok(value)
}

/// Extract query parameters, mapping a rejection to a 400.
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Query parameters shared by the list endpoints.
///
/// Kept as raw strings so that a non-numeric offset produces the
/// field-named message instead of a generic deserialization error.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Rows to skip. Non-negative integer, default 0.
    pub offset: Option<String>,
    /// Case-insensitive substring filter on content.
    pub search: Option<String>,
    /// `dateasc` (default), `datedesc`, or `topasc`.
    pub sort_by: Option<String>,
}

impl ListQuery {
    pub fn plan(&self, page_size: u32) -> Result<PaginationPlan, ValidationError> {
        PaginationPlan::plan(
            self.offset.as_deref(),
            self.sort_by.as_deref(),
            self.search.as_deref(),
            page_size,
        )
    }
}

/// Reject blank `content`.
pub fn require_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        Err(ValidationError::Empty { field: "content" })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::{SortMode, POSTS_PAGE_SIZE};

    #[derive(Debug, Deserialize)]
    struct Body {
        content: String,
    }

    impl Validate for Body {
        fn validate(&self) -> Result<(), ValidationError> {
            require_content(&self.content)
        }
    }

    fn invalid_body(result: Result<Body, AppError>) {
        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, INVALID_BODY),
            other => panic!("expected BadRequest, got: {other:?}"),
        }
    }

    #[test]
    fn extract_json_ok() {
        let body: Body = extract_json(Ok(Bytes::from_static(br#"{"content":"x"}"#))).unwrap();
        assert_eq!(body.content, "x");
    }

    #[test]
    fn malformed_json_is_invalid_body() {
        invalid_body(extract_json(Ok(Bytes::from_static(b"{not json"))));
    }

    #[test]
    fn empty_body_is_invalid_body() {
        invalid_body(extract_json(Ok(Bytes::new())));
    }

    #[test]
    fn validation_failure_is_bad_request() {
        let result: Result<Body, _> =
            extract_validated_json(Ok(Bytes::from_static(br#"{"content":"  "}"#)));
        match result {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "'content' is empty"),
            other => panic!("expected BadRequest, got: {other:?}"),
        }
    }

    #[test]
    fn list_query_plans() {
        let query = ListQuery {
            offset: Some("30".into()),
            search: Some("rust".into()),
            sort_by: Some("topasc".into()),
        };
        let plan = query.plan(POSTS_PAGE_SIZE).unwrap();
        assert_eq!(plan.offset(), 30);
        assert_eq!(plan.sort(), SortMode::TopFirst);
        assert_eq!(plan.search(), Some("rust"));
    }

    #[test]
    fn list_query_bad_offset() {
        let query = ListQuery {
            offset: Some("ten".into()),
            ..ListQuery::default()
        };
        assert_eq!(
            query.plan(POSTS_PAGE_SIZE).unwrap_err().to_string(),
            "'offset' is not a number"
        );
    }

    #[test]
    fn list_query_deserializes_camel_case() {
        let query: ListQuery =
            serde_json::from_str(r#"{"offset":"15","sortBy":"datedesc"}"#).unwrap();
        assert_eq!(query.sort_by.as_deref(), Some("datedesc"));
        assert_eq!(query.offset.as_deref(), Some("15"));
        assert!(query.search.is_none());
    }
}
