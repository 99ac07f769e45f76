//! Clock domain declarations.

use crate::signal::SignalId;
use serde::{Deserialize, Serialize};
use weft_common::Frequency;

/// The name of the default system clock domain.
pub const SYS_DOMAIN: &str = "sys";

/// A clock domain handed to the code generator.
///
/// Synchronous statements in a [`Circuit`](crate::Circuit) are keyed by the
/// domain name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockDomain {
    /// Domain name, e.g. `"sys"`.
    pub name: String,
    /// The clock signal.
    pub clock: SignalId,
    /// The synchronous reset, if any.
    pub reset: Option<SignalId>,
    /// Nominal frequency, when known.
    pub frequency: Option<Frequency>,
}
