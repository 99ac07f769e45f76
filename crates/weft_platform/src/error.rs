//! Error types for resource requests.

/// Errors raised by [`ConstraintManager`](crate::ConstraintManager) requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    /// No resource with this name (and number, if given) exists on the platform.
    #[error("unknown platform resource '{name}'{}", .number.map(|n| format!(":{n}")).unwrap_or_default())]
    UnknownResource {
        /// The requested resource name.
        name: String,
        /// The requested instance number, if one was given.
        number: Option<u32>,
    },

    /// Every instance of the resource has already been granted.
    #[error("all instances of platform resource '{name}' are already requested")]
    ResourceExhausted {
        /// The requested resource name.
        name: String,
    },

    /// The specific instance was granted to an earlier request.
    #[error("platform resource '{name}:{number}' is already requested")]
    AlreadyRequested {
        /// The requested resource name.
        name: String,
        /// The instance number.
        number: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_with_number() {
        let err = ConstraintError::UnknownResource {
            name: "gpmc_ce_n".into(),
            number: Some(3),
        };
        assert_eq!(err.to_string(), "unknown platform resource 'gpmc_ce_n':3");
    }

    #[test]
    fn display_unknown_without_number() {
        let err = ConstraintError::UnknownResource {
            name: "ti_adc".into(),
            number: None,
        };
        assert_eq!(err.to_string(), "unknown platform resource 'ti_adc'");
    }

    #[test]
    fn display_already_requested() {
        let err = ConstraintError::AlreadyRequested {
            name: "led".into(),
            number: 1,
        };
        assert!(err.to_string().contains("led:1"));
    }
}
