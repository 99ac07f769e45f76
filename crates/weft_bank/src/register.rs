//! Register descriptions.

use crate::error::BankError;
use serde::{Deserialize, Serialize};
use weft_ir::{SignalDb, SignalId};

/// Storage and strobe signals behind a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterKind {
    /// Read/write storage owned by the register bank.
    Field {
        /// The storage register.
        storage: SignalId,
    },
    /// Pass-through register driven and consumed by its owner.
    Raw {
        /// One-cycle strobe after a host write.
        re: SignalId,
        /// The written value, valid while `re` is high.
        r: SignalId,
        /// The value returned to host reads.
        w: SignalId,
    },
}

/// A named, fixed-width host-accessible register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    name: String,
    width: u32,
    kind: RegisterKind,
}

impl Register {
    /// A storage register with a reset value.
    pub fn field(db: &mut SignalDb, name: impl Into<String>, width: u32, reset: u64) -> Result<Self, BankError> {
        let name = checked_name(name.into(), width)?;
        let storage = db.alloc_with_reset(name.clone(), width, reset);
        Ok(Self {
            name,
            width,
            kind: RegisterKind::Field { storage },
        })
    }

    /// A pass-through register.
    pub fn raw(db: &mut SignalDb, name: impl Into<String>, width: u32) -> Result<Self, BankError> {
        let name = checked_name(name.into(), width)?;
        let re = db.alloc(format!("{name}_re"), 1);
        let r = db.alloc(format!("{name}_r"), width);
        let w = db.alloc(format!("{name}_w"), width);
        Ok(Self {
            name,
            width,
            kind: RegisterKind::Raw { re, r, w },
        })
    }

    /// Register name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Storage or strobe signals.
    pub fn kind(&self) -> &RegisterKind {
        &self.kind
    }

    /// The storage signal of a field register.
    pub fn storage(&self) -> Option<SignalId> {
        match self.kind {
            RegisterKind::Field { storage } => Some(storage),
            RegisterKind::Raw { .. } => None,
        }
    }

    /// Whether this is a raw register.
    pub fn is_raw(&self) -> bool {
        matches!(self.kind, RegisterKind::Raw { .. })
    }

    /// Every signal of the register.
    pub fn signals(&self) -> Vec<SignalId> {
        match self.kind {
            RegisterKind::Field { storage } => vec![storage],
            RegisterKind::Raw { re, r, w } => vec![re, r, w],
        }
    }

    /// Prepends `prefix` to the register name.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.name.insert_str(0, prefix);
        self
    }
}

fn checked_name(name: String, width: u32) -> Result<String, BankError> {
    if width == 0 {
        return Err(BankError::ZeroWidthRegister { register: name });
    }
    Ok(name)
}

/// Prepends `prefix` to every register name.
pub fn prefixed(prefix: &str, registers: impl IntoIterator<Item = Register>) -> Vec<Register> {
    registers.into_iter().map(|r| r.with_prefix(prefix)).collect()
}
