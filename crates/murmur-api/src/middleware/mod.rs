//! Middleware stack for the feed API.

pub mod pipeline;
pub mod tracing_layer;
