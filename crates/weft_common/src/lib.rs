//! Shared foundational types used across the Weft elaboration layer.
//!
//! Provides content hashing for circuit fingerprints and clock frequency values.

#![warn(missing_docs)]

pub mod frequency;
pub mod hash;

pub use frequency::{Frequency, ParseFrequencyError};
pub use hash::{ContentHash, Fingerprinter};
