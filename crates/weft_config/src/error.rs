//! Error types for `weft.toml` loading and validation.

use std::ops::Range;

/// Errors raised while loading or validating a `weft.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content does not match the configuration schema.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Two resources share a name and instance number.
    #[error("resource '{name}' number {number} defined twice")]
    DuplicateResource {
        /// Resource name.
        name: String,
        /// Instance number.
        number: u32,
    },

    /// A clock names a pin resource that is not declared.
    #[error("clock '{domain}' refers to unknown resource '{resource}'")]
    UnknownClockPin {
        /// Clock domain name.
        domain: String,
        /// The missing resource.
        resource: String,
    },

    /// The register and stream address regions intersect.
    #[error(
        "CSR region 0x{:08x}..0x{:08x} overlaps stream region 0x{:08x}..0x{:08x}",
        .csr.start, .csr.end, .dma.start, .dma.end
    )]
    RegionOverlap {
        /// Register region in bytes.
        csr: Range<u64>,
        /// Stream region in bytes.
        dma: Range<u64>,
    },

    /// Any other inconsistent value.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("app.name".to_string());
        assert_eq!(err.to_string(), "missing required field: app.name");
    }

    #[test]
    fn display_region_overlap() {
        let err = ConfigError::RegionOverlap {
            csr: 0x1000_0000..0x1800_0000,
            dma: 0x1000_0000..0x1001_0000,
        };
        assert_eq!(
            err.to_string(),
            "CSR region 0x10000000..0x18000000 overlaps stream region 0x10000000..0x10010000"
        );
    }

    #[test]
    fn display_unknown_clock_pin() {
        let err = ConfigError::UnknownClockPin {
            domain: "sys".into(),
            resource: "osc".into(),
        };
        assert_eq!(err.to_string(), "clock 'sys' refers to unknown resource 'osc'");
    }
}
