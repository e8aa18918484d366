//! Utilities shared across the container readers.
//!
//! Primitive little-endian field decoding lives here so header, depot and
//! directory decoding all read bytes the same way.

pub mod binary;

pub use binary::{BinaryError, BinaryResult};
