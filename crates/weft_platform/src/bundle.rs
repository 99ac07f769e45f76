//! Granted pin bundles and the constraint records handed to the toolchain.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weft_config::IoAttrs;
use weft_ir::SignalId;

/// The signals granted for one resource request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinBundle {
    /// A plain resource: one signal, one bit per pin.
    Single(SignalId),
    /// A compound resource: one signal per named subsignal, in declared order.
    Compound(Vec<(String, SignalId)>),
}

impl PinBundle {
    /// The signal of a plain resource.
    pub fn signal(&self) -> Option<SignalId> {
        match self {
            PinBundle::Single(s) => Some(*s),
            PinBundle::Compound(_) => None,
        }
    }

    /// The signal of a named subsignal.
    pub fn subsignal(&self, name: &str) -> Option<SignalId> {
        match self {
            PinBundle::Single(_) => None,
            PinBundle::Compound(subs) => subs.iter().find(|(n, _)| n == name).map(|(_, s)| *s),
        }
    }

    /// Every granted signal.
    pub fn signals(&self) -> Vec<SignalId> {
        match self {
            PinBundle::Single(s) => vec![*s],
            PinBundle::Compound(subs) => subs.iter().map(|(_, s)| *s).collect(),
        }
    }
}

/// An electrical constraint attached to a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// I/O standard, e.g. `LVCMOS33`.
    IoStandard(String),
    /// Drive strength in mA.
    Drive(u32),
    /// A verbatim toolchain constraint.
    Misc(String),
}

impl Constraint {
    /// Expands configuration attributes into constraints.
    pub fn from_attrs(attrs: &IoAttrs) -> Vec<Constraint> {
        let mut out = Vec::new();
        if let Some(std) = &attrs.io_standard {
            out.push(Constraint::IoStandard(std.clone()));
        }
        if let Some(drive) = attrs.drive {
            out.push(Constraint::Drive(drive));
        }
        out.extend(attrs.misc.iter().cloned().map(Constraint::Misc));
        out
    }
}

/// Identifies where a constrained signal came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceName {
    /// Resource name.
    pub name: String,
    /// Instance number.
    pub number: u32,
    /// Subsignal name for compound resources.
    pub subsignal: Option<String>,
}

/// Pin assignment and constraints of one top-level I/O signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigConstraint {
    /// The constrained signal.
    pub signal: SignalId,
    /// Pins, least significant bit first.
    pub pins: Vec<String>,
    /// Resource-level constraints followed by subsignal-level ones.
    pub constraints: Vec<Constraint>,
    /// Origin of the signal.
    pub resource: ResourceName,
}

/// A verbatim toolchain command with named signal placeholders.
///
/// The code generator substitutes each `{key}` in `template` with the final
/// name of the mapped signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCommand {
    /// Command text with `{key}` placeholders.
    pub template: String,
    /// Placeholder bindings.
    pub args: BTreeMap<String, SignalId>,
}
