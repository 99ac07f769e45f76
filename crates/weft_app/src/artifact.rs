//! The elaboration result handed to the external code generator.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use weft_bank::{format_symtab, SymbolEntry};
use weft_common::{ContentHash, Fingerprinter};
use weft_ir::{Circuit, ClockDomain, Namespace, SignalDb, SignalId};
use weft_platform::{PlatformCommand, SigConstraint};

/// A signal with its resolved, unique flat name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSignal {
    /// Signal handle used throughout the circuit.
    pub id: SignalId,
    /// Unique name for the generated HDL.
    pub name: String,
    /// Width in bits.
    pub width: u32,
    /// Reset value of registers driving this signal.
    pub reset: u64,
}

/// Everything the code generator and the host software need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Application name.
    pub name: String,
    /// The flattened circuit.
    pub circuit: Circuit,
    /// Every signal with its resolved name, in allocation order.
    pub signals: Vec<NamedSignal>,
    /// Clock domains referenced by the circuit.
    pub clock_domains: Vec<ClockDomain>,
    /// Top-level ports, in request order.
    pub io_signals: Vec<SignalId>,
    /// Pin assignments and I/O constraints.
    pub sig_constraints: Vec<SigConstraint>,
    /// Raw commands for the toolchain.
    pub platform_commands: Vec<PlatformCommand>,
    /// Address map.
    pub symtab: Vec<SymbolEntry>,
    /// Fingerprint of the circuit, its signals and the address map.
    pub fingerprint: ContentHash,
}

/// Inputs for [`Artifact::new`] other than the signal database.
#[derive(Debug)]
pub(crate) struct ArtifactParts {
    pub name: String,
    pub circuit: Circuit,
    pub clock_domains: Vec<ClockDomain>,
    pub io_signals: Vec<SignalId>,
    pub sig_constraints: Vec<SigConstraint>,
    pub platform_commands: Vec<PlatformCommand>,
    pub symtab: Vec<SymbolEntry>,
}

impl Artifact {
    pub(crate) fn new(db: &SignalDb, parts: ArtifactParts) -> Result<Self, AppError> {
        let ns = Namespace::build(db);
        let signals: Vec<NamedSignal> = ns
            .iter()
            .map(|(id, name)| NamedSignal {
                id,
                name: name.to_string(),
                width: db[id].width,
                reset: db[id].reset,
            })
            .collect();

        let config = bincode::config::standard();
        let mut fp = Fingerprinter::new();
        fp.part(parts.circuit.fingerprint(db)?.as_bytes())
            .part(&bincode::serde::encode_to_vec(&parts.symtab, config)?)
            .part(&bincode::serde::encode_to_vec(&signals, config)?);

        Ok(Self {
            name: parts.name,
            circuit: parts.circuit,
            signals,
            clock_domains: parts.clock_domains,
            io_signals: parts.io_signals,
            sig_constraints: parts.sig_constraints,
            platform_commands: parts.platform_commands,
            symtab: parts.symtab,
            fingerprint: fp.finish(),
        })
    }

    /// The address map as tab-separated `name kind base size` lines.
    pub fn formatted_symtab(&self) -> String {
        format_symtab(&self.symtab)
    }

    /// Resolved name of a signal.
    pub fn signal_name(&self, id: SignalId) -> Option<&str> {
        self.signals.iter().find(|s| s.id == id).map(|s| s.name.as_str())
    }

    /// Looks up a signal by resolved name.
    pub fn find_signal(&self, name: &str) -> Option<&NamedSignal> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
