//! Unified error type for key split planning
//!
//! Structural input problems (DEK shape, FQN grammar, rule enum, missing
//! definitions) surface immediately. Per-value grant resolution failures are
//! absorbed by the planner where the attribute rule allows it and only reach
//! the caller as [`KeySplitError::NoKasFound`] from the resolver itself.
//!
//! # Example
//!
//! ```
//! use opentdf_keysplit::{KeySplitError, XorSplitter};
//!
//! let splitter = XorSplitter::new();
//! let err = splitter.generate_splits(&[], &[0u8; 16]).unwrap_err();
//! assert!(matches!(err, KeySplitError::InvalidDek { expected: 32, got: 16 }));
//! assert_eq!(err.error_code(), "KEYSPLIT_E_DEK_LENGTH");
//! ```

use crate::fqn::FqnError;
use crate::policy::AttributeRule;
use thiserror::Error;

/// Errors produced while compiling an attribute policy into key splits
#[derive(Debug, Error)]
pub enum KeySplitError {
    #[error("DEK cannot be empty")]
    EmptyDek,

    #[error("invalid DEK length: expected {expected} bytes, got {got}")]
    InvalidDek { expected: usize, got: usize },

    #[error("no default KAS configured and the policy yields no KAS grants")]
    NoDefaultKas,

    #[error("attribute definition missing for value '{fqn}'")]
    MissingDefinition { fqn: String },

    #[error("invalid attribute FQN '{fqn}': {source}")]
    InvalidAttributeFqn {
        fqn: String,
        #[source]
        source: FqnError,
    },

    #[error("invalid attribute rule type for '{fqn}': unsupported rule '{rule}'")]
    InvalidRule { fqn: String, rule: AttributeRule },

    #[error("no grants found for attribute value '{fqn}'")]
    NoKasFound { fqn: String },

    #[error("split generation failed: {reason}")]
    SplitGeneration {
        reason: String,
        #[source]
        source: Option<KeySourceError>,
    },

    #[error("no splits generated")]
    NoSplitsGenerated,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Failure reported by a [`KeySource`](crate::splitter::KeySource)
#[derive(Debug, Error)]
pub enum KeySourceError {
    #[error("random source unavailable: {0}")]
    Rng(#[from] rand::Error),

    #[error("random source failed: {0}")]
    Other(String),
}

impl KeySplitError {
    /// Returns true if the error came from the environment rather than the input
    ///
    /// Only failures of the random source qualify. Validation errors will fail
    /// again on the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KeySplitError::SplitGeneration { source: Some(_), .. })
    }

    /// Returns true for structural problems with the caller's input
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            KeySplitError::EmptyDek
                | KeySplitError::InvalidDek { .. }
                | KeySplitError::MissingDefinition { .. }
                | KeySplitError::InvalidAttributeFqn { .. }
                | KeySplitError::InvalidRule { .. }
        )
    }

    /// Returns a suggestion for how to fix this error, if available
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            KeySplitError::EmptyDek | KeySplitError::InvalidDek { .. } => {
                Some("Provide a 32-byte AES-256 data encryption key")
            }
            KeySplitError::NoDefaultKas => {
                Some("Configure a default KAS with XorSplitter::with_default_kas()")
            }
            KeySplitError::MissingDefinition { .. } => {
                Some("Attach the attribute definition to every value before splitting")
            }
            KeySplitError::InvalidAttributeFqn { source, .. } => Some(source.hint()),
            KeySplitError::InvalidRule { .. } => {
                Some("Use one of allOf, anyOf, hierarchy or unspecified")
            }
            KeySplitError::NoKasFound { .. } => {
                Some("Assign a KAS grant or key mapping to the value, definition or namespace")
            }
            _ => None,
        }
    }

    /// Returns a stable error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            KeySplitError::EmptyDek => "KEYSPLIT_E_DEK_EMPTY",
            KeySplitError::InvalidDek { .. } => "KEYSPLIT_E_DEK_LENGTH",
            KeySplitError::NoDefaultKas => "KEYSPLIT_E_NO_DEFAULT_KAS",
            KeySplitError::MissingDefinition { .. } => "KEYSPLIT_E_DEFINITION_MISSING",
            KeySplitError::InvalidAttributeFqn { .. } => "KEYSPLIT_E_FQN_INVALID",
            KeySplitError::InvalidRule { .. } => "KEYSPLIT_E_RULE_INVALID",
            KeySplitError::NoKasFound { .. } => "KEYSPLIT_E_NO_KAS",
            KeySplitError::SplitGeneration { .. } => "KEYSPLIT_E_SPLIT_GENERATION",
            KeySplitError::NoSplitsGenerated => "KEYSPLIT_E_NO_SPLITS",
            KeySplitError::SerializationError(_) => "KEYSPLIT_E_SERIALIZATION",
        }
    }
}
