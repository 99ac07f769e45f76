//! The circuit representation produced by elaboration.
//!
//! All signals of an elaboration session live in one [`SignalDb`]. A
//! [`Circuit`] is a fragment of behaviour over those signals: combinational
//! statements, per-clock-domain synchronous statements and black-box
//! [`Instance`]s. Fragments merge by concatenation, so independently
//! elaborated actors can be flattened into a single circuit without
//! renumbering.

#![warn(missing_docs)]

pub mod circuit;
pub mod clock;
pub mod expr;
pub mod instance;
pub mod namespace;
pub mod signal;
pub mod stmt;

pub use circuit::Circuit;
pub use clock::{ClockDomain, SYS_DOMAIN};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use instance::{Instance, InstancePin, ParamValue, PinBinding};
pub use namespace::Namespace;
pub use signal::{Signal, SignalDb, SignalId, SignalRef};
pub use stmt::Stmt;
