//! Commonly used types in one import
//!
//! ```rust
//! use opentdf_keysplit::prelude::*;
//!
//! let config = SplitterConfig::new().default_kas_url("https://kas.example.com/");
//! let splitter = XorSplitter::from_config(config);
//! let result = splitter.generate_splits(&[], &[0u8; DEK_SIZE])?;
//! assert_eq!(result.splits[0].kas_urls, vec!["https://kas.example.com/".to_string()]);
//! # Ok::<(), KeySplitError>(())
//! ```

pub use crate::config::SplitterConfig;
pub use crate::error::{KeySourceError, KeySplitError};
pub use crate::expression::{AttributeClause, BooleanExpression};
pub use crate::fqn::{AttributeValueFqn, FqnError};
pub use crate::planner::SplitAssignment;
pub use crate::policy::{
    Algorithm, AttributeDefinition, AttributeRule, AttributeValue, CachedKasKey,
    KasPublicKeyAlgEnum, KeyAccessServer, Namespace, SimpleKasKey, SimpleKasPublicKey,
};
pub use crate::splitter::{
    KasPublicKey, KeySource, OsKeySource, Split, SplitResult, XorSplitter, DEK_SIZE,
};
