//! Chat proxy handler.
//!
//! One inbound request becomes at most one upstream call. Every failure is terminal and
//! maps to a fixed status and body; see [`ProxyError`].

mod error;
mod handler;
mod js_text;
pub mod normalize;

pub use error::ProxyError;
pub use handler::{ChatProxy, ContentType, InboundRequest, ProxyResponse};
pub use normalize::NormalizedReply;
