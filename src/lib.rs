//! Attribute policy to key split planning for OpenTDF
//!
//! A TDF's data encryption key (DEK) is wrapped for one or more Key Access
//! Servers (KAS). Which servers, and whether they must all cooperate, follows
//! from the attribute values in the data policy and the grants attached to
//! them. This crate compiles such a policy into XOR key splits.
//!
//! ```
//! use opentdf_keysplit::prelude::*;
//! use std::sync::Arc;
//!
//! let dept = Arc::new(AttributeDefinition::new(
//!     "https://example.com/attr/Dept",
//!     AttributeRule::AllOf,
//! ));
//! let values = vec![
//!     AttributeValue::new("https://example.com/attr/Dept/value/Eng")
//!         .with_definition(Arc::clone(&dept))
//!         .with_grant(KeyAccessServer::new("https://kas.us/")),
//!     AttributeValue::new("https://example.com/attr/Dept/value/Legal")
//!         .with_definition(dept)
//!         .with_grant(KeyAccessServer::new("https://kas.uk/")),
//! ];
//!
//! let result = XorSplitter::new().generate_splits(&values, &[42u8; 32])?;
//! assert_eq!(result.splits.len(), 2);
//! # Ok::<(), KeySplitError>(())
//! ```

pub mod config;
pub mod error;
pub mod expression;
pub mod fqn;
pub mod grants;
pub mod optimizer;
pub mod planner;
pub mod policy;
pub mod prelude;
pub mod splitter;

pub use config::SplitterConfig;
pub use error::{KeySourceError, KeySplitError};
pub use expression::{build_boolean_expression, AttributeClause, BooleanExpression};
pub use fqn::{validate_attribute_fqn, AttributeValueFqn, FqnError};
pub use grants::{resolve_attribute_grants, GrantLevel, KasGrant, ResolvedGrants};
pub use optimizer::optimize_split_assignments;
pub use planner::{create_split_plan, SplitAssignment};
pub use policy::{
    Algorithm, AttributeDefinition, AttributeRule, AttributeValue, CachedKasKey,
    KasPublicKeyAlgEnum, KeyAccessServer, Namespace, SimpleKasKey, SimpleKasPublicKey,
};
pub use splitter::{
    collect_all_public_keys, format_algorithm, KasPublicKey, KeySource, OsKeySource, Split,
    SplitResult, XorSplitter, DEK_SIZE,
};
