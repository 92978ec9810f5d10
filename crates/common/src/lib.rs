//! Common types, protocol definitions, and errors shared across `ctr-relay` crates.

pub mod error;
pub mod protocol;

pub use error::RelayError;
