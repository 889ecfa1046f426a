//! Gateway: HTTP host for the chat proxy.
//!
//! Single port. `GET /` is a health probe; `/chat` (and the Netlify-style
//! `/.netlify/functions/chat`) accept any method and hand the request to the proxy.

mod server;

pub use server::{router, run_gateway, GatewayState};
