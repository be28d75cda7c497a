//! Inbound Adapters
//!
//! The chat command surface and the Axum-based HTTP server that drive the
//! application layer.

pub mod commands;
mod handlers;
mod rate_limit;
mod server;

pub use commands::{Command, respond};
pub use server::HttpServer;
