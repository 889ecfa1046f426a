//! Chat proxy library: validates a frontend chat message, forwards it to the configured
//! upstream API, and normalizes the reply. Shared by the CLI and the gateway.

pub mod config;
pub mod gateway;
pub mod proxy;
pub mod upstream;
