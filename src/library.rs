//! Presentation helpers for service tracks and metadata extraction for
//! uploads.

mod display;
mod upload;

pub use display::*;
pub use upload::*;

#[cfg(test)]
mod tests;
