//! The symbol table handed to host software.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a symbol table entry addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// A register group.
    Csr,
    /// A stream carrying data from the host into the fabric.
    StreamFrom,
    /// A stream carrying data from the fabric to the host.
    StreamTo,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Csr => "csr",
            SymbolKind::StreamFrom => "stream_from",
            SymbolKind::StreamTo => "stream_to",
        })
    }
}

/// One named address range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    /// Group or stream name.
    pub name: String,
    /// Entry kind.
    pub kind: SymbolKind,
    /// First byte address.
    pub base: u64,
    /// Size in bytes.
    pub size: u64,
    /// Group UID, for register groups.
    pub uid: Option<u32>,
}

impl SymbolEntry {
    /// One past the last byte address.
    pub fn end(&self) -> u64 {
        self.base + self.size
    }
}

impl fmt::Display for SymbolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t0x{:08x}\t0x{:x}", self.name, self.kind, self.base, self.size)
    }
}

/// Renders entries as tab-separated lines, one per entry.
pub fn format_symtab(entries: &[SymbolEntry]) -> String {
    entries.iter().map(|e| format!("{e}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_lines() {
        let entries = vec![
            SymbolEntry {
                name: "wc".into(),
                kind: SymbolKind::Csr,
                base: 0x0800_0000,
                size: 0x8,
                uid: Some(2),
            },
            SymbolEntry {
                name: "wc_data".into(),
                kind: SymbolKind::StreamTo,
                base: 0x1000_2000,
                size: 0x2000,
                uid: None,
            },
        ];
        assert_eq!(
            format_symtab(&entries),
            "wc\tcsr\t0x08000000\t0x8\nwc_data\tstream_to\t0x10002000\t0x2000\n"
        );
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&SymbolKind::StreamFrom).unwrap();
        assert_eq!(json, "\"stream_from\"");
    }
}
