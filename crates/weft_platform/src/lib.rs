//! Platform I/O resources and the constraint manager.
//!
//! Components never name physical pins directly. They ask the
//! [`ConstraintManager`] for a named resource (optionally a specific instance
//! number) and receive a [`PinBundle`] of freshly allocated top-level signals.
//! The manager remembers every grant so it can later report the design's I/O
//! signals and the pin/electrical constraint of each one.

#![warn(missing_docs)]

pub mod bundle;
pub mod error;
pub mod manager;

pub use bundle::{Constraint, PinBundle, PlatformCommand, ResourceName, SigConstraint};
pub use error::ConstraintError;
pub use manager::ConstraintManager;
