//! HTTP client for the streaming service.
//!
//! `ApiClient` wraps a shared `reqwest::Client` and the current session
//! (signed-in user + bearer token). Everything the UI shows comes through here;
//! the player only borrows the stream endpoints and the HTTP client.

mod client;
mod error;
mod types;

pub use client::{ApiClient, StreamEndpoints};
pub use error::{ApiError, Result};
pub use types::*;

#[cfg(test)]
mod tests;
