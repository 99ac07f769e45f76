//! Error type for application assembly and elaboration.

use weft_bank::BankError;
use weft_common::ParseFrequencyError;
use weft_config::ConfigError;
use weft_flow::FlowError;
use weft_platform::ConstraintError;

/// Errors raised while building or elaborating a base application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A platform resource request failed.
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// Graph construction or flattening failed.
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// Register or stream allocation failed.
    #[error(transparent)]
    Bank(#[from] BankError),

    /// A clock frequency could not be parsed.
    #[error(transparent)]
    Frequency(#[from] ParseFrequencyError),

    /// No factory is registered for a component kind.
    #[error("unknown component kind '{kind}'")]
    UnknownComponentKind {
        /// The configured kind.
        kind: String,
    },

    /// Two components share a name.
    #[error("component name '{name}' is used twice")]
    DuplicateComponentName {
        /// The repeated name.
        name: String,
    },

    /// A component parameter is missing its expected type or value.
    #[error("component '{component}': parameter '{param}' {reason}")]
    InvalidParam {
        /// The component label.
        component: String,
        /// The parameter name.
        param: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A platform resource does not have the pins a component needs.
    #[error("resource '{resource}' cannot serve as {role}: {reason}")]
    ResourceShape {
        /// The resource name.
        resource: String,
        /// What the resource was requested for.
        role: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A configured value does not fit a black-box instance parameter.
    #[error("parameter '{param}' of instance '{instance}' cannot hold {value}")]
    ParamOverflow {
        /// Instance module name.
        instance: String,
        /// Parameter name.
        param: String,
        /// The rejected value.
        value: u64,
    },

    /// The circuit could not be encoded for fingerprinting.
    #[error("failed to fingerprint circuit: {0}")]
    Fingerprint(#[from] bincode::error::EncodeError),

    /// The artifact could not be serialized.
    #[error("failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_kind() {
        let err = AppError::UnknownComponentKind {
            kind: "fft".into(),
        };
        assert_eq!(err.to_string(), "unknown component kind 'fft'");
    }

    #[test]
    fn display_invalid_param() {
        let err = AppError::InvalidParam {
            component: "wc".into(),
            param: "uid".into(),
            reason: "must be an integer".into(),
        };
        assert_eq!(err.to_string(), "component 'wc': parameter 'uid' must be an integer");
    }

    #[test]
    fn wrapped_errors_are_transparent() {
        let err: AppError = BankError::NoMaster.into();
        assert_eq!(err.to_string(), "no CSR bus master attached");
        let err: AppError = ConstraintError::ResourceExhausted {
            name: "adc".into(),
        }
        .into();
        assert!(err.to_string().contains("adc"));
    }
}
