//! Error types for register and stream allocation.

use weft_flow::FlowError;

/// Errors raised while allocating registers or streams or generating the
/// address decoder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BankError {
    /// Two register groups use the same UID.
    #[error("register group '{group}' reuses UID {uid} of group '{existing}'")]
    DuplicateUid {
        /// The UID.
        uid: u32,
        /// The group being requested.
        group: String,
        /// The group that already holds the UID.
        existing: String,
    },

    /// Two register groups use the same name.
    #[error("register group '{name}' is already defined")]
    DuplicateGroupName {
        /// The repeated name.
        name: String,
    },

    /// A group name is reserved for the bus master.
    #[error("register group name '{name}' is reserved")]
    ReservedGroupName {
        /// The reserved name.
        name: String,
    },

    /// A group has no registers.
    #[error("register group '{name}' has no registers")]
    EmptyGroup {
        /// The group name.
        name: String,
    },

    /// Two registers of one group share a name.
    #[error("register '{register}' appears twice in group '{group}'")]
    DuplicateRegister {
        /// The group name.
        group: String,
        /// The repeated register name.
        register: String,
    },

    /// A register was declared with width 0.
    #[error("register '{register}' has zero width")]
    ZeroWidthRegister {
        /// The register name.
        register: String,
    },

    /// A raw register is wider than one bus word.
    #[error("raw register '{group}.{register}' is {width} bits wide; the CSR bus carries {data_width}")]
    RawTooWide {
        /// The group name.
        group: String,
        /// The register name.
        register: String,
        /// The register width.
        width: u32,
        /// The CSR data width.
        data_width: u32,
    },

    /// The decoder was requested before a bus master was attached.
    #[error("no CSR bus master attached")]
    NoMaster,

    /// The allocated words do not fit the master's address width.
    #[error("{words} CSR words do not fit a {address_width}-bit address bus")]
    AddressOverflow {
        /// Words allocated.
        words: u64,
        /// Address width of the master.
        address_width: u32,
    },

    /// Allocations exceed the configured address region.
    #[error("{kind} allocations need 0x{needed:x} bytes but the region spans 0x{span:x}")]
    RegionOverflow {
        /// `"csr"` or `"stream"`.
        kind: &'static str,
        /// Bytes required.
        needed: u64,
        /// Bytes available.
        span: u64,
    },

    /// More streams were requested than the bridge supports.
    #[error("stream '{name}' exceeds the capacity of {capacity} stream endpoints")]
    StreamCapacityExceeded {
        /// The rejected stream.
        name: String,
        /// Configured capacity, both directions combined.
        capacity: usize,
    },

    /// Two streams use the same name.
    #[error("stream '{name}' is already defined")]
    DuplicateStreamName {
        /// The repeated name.
        name: String,
    },

    /// A stream payload layout could not be built.
    #[error(transparent)]
    Flow(#[from] FlowError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_duplicate_uid() {
        let err = BankError::DuplicateUid {
            uid: 4,
            group: "wg".into(),
            existing: "wc".into(),
        };
        assert_eq!(
            err.to_string(),
            "register group 'wg' reuses UID 4 of group 'wc'"
        );
    }

    #[test]
    fn display_region_overflow() {
        let err = BankError::RegionOverflow {
            kind: "csr",
            needed: 0x20,
            span: 0x10,
        };
        assert_eq!(
            err.to_string(),
            "csr allocations need 0x20 bytes but the region spans 0x10"
        );
    }

    #[test]
    fn flow_error_is_transparent() {
        let err: BankError = FlowError::ZeroWidthField {
            field: "data".into(),
        }
        .into();
        assert_eq!(err.to_string(), "field 'data' has zero width");
    }
}
