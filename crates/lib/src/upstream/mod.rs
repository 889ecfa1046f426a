//! Upstream chat API abstraction and HTTP client.
//!
//! The proxy depends on the [`Upstream`] trait so tests can substitute a deterministic stub.

mod client;

pub use client::{HttpUpstream, Upstream, UpstreamError, UpstreamRequest};
