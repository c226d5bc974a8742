//! Test utilities for invite providers
//!
//! Fixtures, a counting completion delegate, and async helpers for driving
//! loads and send flows under a deadline. Used by this crate's unit tests,
//! its integration tests, and by hosts testing their own providers.

pub mod async_helpers;
pub mod fixtures;
pub mod recording;

pub use async_helpers::*;
pub use fixtures::*;
pub use recording::*;
