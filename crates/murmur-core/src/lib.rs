#![deny(missing_docs)]

//! # murmur-core: Foundational Types for the murmur Feed Service
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It performs no I/O and has no internal crate dependencies, only
//! `serde`, `thiserror`, `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** An [`IdentityId`] cannot be
//!    passed where a [`PostId`] is expected, and a [`NetworkOrigin`] is always
//!    a parsed IP address, never a raw header string.
//!
//! 2. **Untrusted input is planned, not passed through.** List endpoints hand
//!    their raw query parameters to [`PaginationPlan::plan`], which yields a
//!    bounded, validated plan or a [`ValidationError`] carrying the exact
//!    client-facing message.
//!
//! 3. **Structured errors with `thiserror`**: no `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod error;
pub mod feed;
pub mod identity;
pub mod pagination;

// Re-export primary types at crate root for ergonomic imports.
pub use error::ValidationError;
pub use feed::{CommentId, PostId};
pub use identity::{Identity, IdentityId, NetworkOrigin};
pub use pagination::{Page, PaginationPlan, SortMode, COMMENTS_PAGE_SIZE, POSTS_PAGE_SIZE};
