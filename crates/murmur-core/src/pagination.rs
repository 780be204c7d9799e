//! # Pagination & Sort Planning
//!
//! Translates the untrusted `offset`, `sortBy`, and `search` query
//! parameters of list endpoints into a [`PaginationPlan`] the data-access
//! layer consumes exactly once.
//!
//! ## Sort labels
//!
//! | `sortBy`   | [`SortMode`]                | Order                                  |
//! |------------|-----------------------------|----------------------------------------|
//! | `dateasc`  | [`SortMode::OldestFirst`]   | creation time ascending, then id       |
//! | `datedesc` | [`SortMode::NewestFirst`]   | creation time descending, then id      |
//! | `topasc`   | [`SortMode::TopFirst`]      | likes descending, newest, then id      |
//!
//! Absent or unrecognised labels fall back to `dateasc`. The same mapping
//! applies to posts and comments.
//!
//! ## Next-page signal
//!
//! The cursor is offset-based: a full page means there may be more rows, so
//! `nextOffset = offset + pageSize`; a short page means there is no next
//! page. Rows inserted or deleted between requests can shift the window.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Page size for post listings.
pub const POSTS_PAGE_SIZE: u32 = 15;

/// Page size for comment listings.
pub const COMMENTS_PAGE_SIZE: u32 = 15;

/// Ordering applied to a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortMode {
    /// Most recent first (`datedesc`).
    NewestFirst,
    /// Oldest first (`dateasc`, the default).
    OldestFirst,
    /// Most liked first (`topasc`).
    TopFirst,
}

impl SortMode {
    /// Mode used when `sortBy` is absent or unrecognised.
    pub const DEFAULT: Self = Self::OldestFirst;

    /// Map a raw `sortBy` value. Never fails.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("dateasc") => Self::OldestFirst,
            Some("datedesc") => Self::NewestFirst,
            Some("topasc") => Self::TopFirst,
            _ => Self::DEFAULT,
        }
    }

    /// The wire label for this mode.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::OldestFirst => "dateasc",
            Self::NewestFirst => "datedesc",
            Self::TopFirst => "topasc",
        }
    }
}

impl Default for SortMode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A validated, bounded list query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationPlan {
    offset: i64,
    limit: i64,
    sort: SortMode,
    search: Option<String>,
}

impl PaginationPlan {
    /// Build a plan from raw query parameters.
    ///
    /// - `offset`: absent or empty → 0; non-numeric → `'offset' is not a number`;
    ///   negative → `'offset' must not be negative`.
    /// - `sort`: see [`SortMode::from_param`].
    /// - `search`: passed through verbatim; empty means no filter.
    pub fn plan(
        offset: Option<&str>,
        sort: Option<&str>,
        search: Option<&str>,
        page_size: u32,
    ) -> Result<Self, ValidationError> {
        let offset = match offset {
            None | Some("") => 0,
            Some(raw) => {
                let parsed = raw
                    .parse::<i64>()
                    .map_err(|_| ValidationError::NotANumber { field: "offset" })?;
                if parsed < 0 {
                    return Err(ValidationError::NegativeOffset(parsed));
                }
                parsed
            }
        };

        let search = search.filter(|s| !s.is_empty()).map(str::to_string);

        Ok(Self {
            offset,
            limit: i64::from(page_size),
            sort: SortMode::from_param(sort),
            search,
        })
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Fixed page size.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Requested ordering.
    pub fn sort(&self) -> SortMode {
        self.sort
    }

    /// Optional case-insensitive substring filter.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Offset of the following page, given how many rows this page returned.
    pub fn next_offset(&self, returned: usize) -> Option<i64> {
        let returned = i64::try_from(returned).unwrap_or(i64::MAX);
        if returned >= self.limit {
            Some(self.offset.saturating_add(self.limit))
        } else {
            None
        }
    }
}

/// One page of results plus the offset of the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Rows in this page, in plan order.
    pub items: Vec<T>,
    /// Offset to request next; `None` when this was the last page.
    pub next_offset: Option<i64>,
}

impl<T> Page<T> {
    /// Wrap the rows returned for `plan`.
    pub fn from_rows(plan: &PaginationPlan, items: Vec<T>) -> Self {
        let next_offset = plan.next_offset(items.len());
        Self { items, next_offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plan(offset: Option<&str>, sort: Option<&str>) -> PaginationPlan {
        PaginationPlan::plan(offset, sort, None, POSTS_PAGE_SIZE).unwrap()
    }

    #[test]
    fn absent_offset_defaults_to_zero() {
        assert_eq!(plan(None, None).offset(), 0);
        assert_eq!(plan(Some(""), None).offset(), 0);
    }

    #[test]
    fn numeric_offset_is_parsed() {
        assert_eq!(plan(Some("30"), None).offset(), 30);
    }

    #[test]
    fn non_numeric_offset_is_rejected() {
        let err = PaginationPlan::plan(Some("ten"), None, None, 15).unwrap_err();
        assert_eq!(err, ValidationError::NotANumber { field: "offset" });
        assert_eq!(err.to_string(), "'offset' is not a number");
    }

    #[test]
    fn negative_offset_is_rejected() {
        let err = PaginationPlan::plan(Some("-15"), None, None, 15).unwrap_err();
        assert_eq!(err, ValidationError::NegativeOffset(-15));
    }

    #[test]
    fn overflowing_offset_is_not_a_number() {
        let err =
            PaginationPlan::plan(Some("99999999999999999999"), None, None, 15).unwrap_err();
        assert_eq!(err, ValidationError::NotANumber { field: "offset" });
    }

    #[test]
    fn known_sort_labels_map_to_modes() {
        assert_eq!(plan(None, Some("dateasc")).sort(), SortMode::OldestFirst);
        assert_eq!(plan(None, Some("datedesc")).sort(), SortMode::NewestFirst);
        assert_eq!(plan(None, Some("topasc")).sort(), SortMode::TopFirst);
    }

    #[test]
    fn absent_sort_uses_default() {
        assert_eq!(plan(None, None).sort(), SortMode::DEFAULT);
        assert_eq!(SortMode::DEFAULT.as_param(), "dateasc");
    }

    #[test]
    fn empty_search_means_no_filter() {
        let p = PaginationPlan::plan(None, None, Some(""), 15).unwrap();
        assert_eq!(p.search(), None);
        let p = PaginationPlan::plan(None, None, Some("snake"), 15).unwrap();
        assert_eq!(p.search(), Some("snake"));
    }

    #[test]
    fn limit_is_the_page_size() {
        assert_eq!(plan(None, None).limit(), 15);
        let p = PaginationPlan::plan(None, None, None, COMMENTS_PAGE_SIZE).unwrap();
        assert_eq!(p.limit(), i64::from(COMMENTS_PAGE_SIZE));
    }

    #[test]
    fn full_page_yields_next_offset() {
        let p = plan(Some("0"), Some("topasc"));
        let page = Page::from_rows(&p, vec![0u8; 15]);
        assert_eq!(page.next_offset, Some(15));
    }

    #[test]
    fn short_page_has_no_next_offset() {
        let p = plan(Some("0"), Some("topasc"));
        let page = Page::from_rows(&p, vec![0u8; 10]);
        assert_eq!(page.next_offset, None);
    }

    #[test]
    fn empty_page_has_no_next_offset() {
        let p = plan(Some("45"), None);
        assert_eq!(p.next_offset(0), None);
    }

    proptest! {
        /// Any label outside the three known ones falls back to the default.
        #[test]
        fn unknown_sort_labels_fall_back(label in "\\PC*") {
            prop_assume!(!["dateasc", "datedesc", "topasc"].contains(&label.as_str()));
            prop_assert_eq!(SortMode::from_param(Some(&label)), SortMode::DEFAULT);
        }

        /// nextOffset is offset + pageSize exactly when the page is full.
        #[test]
        fn next_offset_rule(offset in 0i64..1_000_000, returned in 0usize..40) {
            let raw = offset.to_string();
            let p = PaginationPlan::plan(Some(&raw), None, None, POSTS_PAGE_SIZE).unwrap();
            let expected = if returned >= POSTS_PAGE_SIZE as usize {
                Some(offset + i64::from(POSTS_PAGE_SIZE))
            } else {
                None
            };
            prop_assert_eq!(p.next_offset(returned), expected);
        }

        /// Every non-negative integer offset is accepted verbatim.
        #[test]
        fn non_negative_offsets_accepted(offset in 0i64..i64::MAX) {
            let raw = offset.to_string();
            let p = PaginationPlan::plan(Some(&raw), None, None, 15).unwrap();
            prop_assert_eq!(p.offset(), offset);
        }
    }
}
