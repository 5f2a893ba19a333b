//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, deterministic random number generation.
//! CRITICAL: every random draw in the engine goes through a [`DrawSource`]
//! owned by exactly one transaction. There is no process-wide generator.

mod draw_source;
mod xorshift;

pub use draw_source::DrawSource;
pub use xorshift::{derive_seed, RngManager};
