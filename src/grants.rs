//! Attribute grant resolution
//!
//! A value inherits KAS grants from the most specific level that has any:
//! the value itself, then its definition, then the definition's namespace.
//! At each level mapped keys ([`SimpleKasKey`]) win over legacy
//! [`KeyAccessServer`] grants.

use crate::error::KeySplitError;
use crate::policy::{
    AttributeDefinition, AttributeValue, KeyAccessServer, SimpleKasKey, SimpleKasPublicKey,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Policy level a set of grants was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantLevel {
    Value,
    Definition,
    Namespace,
}

impl fmt::Display for GrantLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantLevel::Value => f.write_str("value"),
            GrantLevel::Definition => f.write_str("definition"),
            GrantLevel::Namespace => f.write_str("namespace"),
        }
    }
}

/// A KAS URL and, when known, the public key to wrap for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KasGrant {
    pub url: String,
    pub public_key: Option<SimpleKasPublicKey>,
}

impl KasGrant {
    pub fn new(url: impl Into<String>, public_key: Option<SimpleKasPublicKey>) -> Self {
        Self {
            url: url.into(),
            public_key,
        }
    }
}

/// Grants resolved for one attribute value
#[derive(Debug, Clone)]
pub struct ResolvedGrants {
    pub level: GrantLevel,
    pub attribute: Option<Arc<AttributeDefinition>>,
    pub grants: Vec<KasGrant>,
}

/// Resolve the effective KAS grants of `value`
///
/// Fails with [`KeySplitError::NoKasFound`] if no level carries a usable grant.
pub fn resolve_attribute_grants(value: &AttributeValue) -> Result<ResolvedGrants, KeySplitError> {
    let definition = value.attribute.as_ref();

    let mut levels: Vec<(GrantLevel, &[KeyAccessServer], &[SimpleKasKey])> =
        vec![(GrantLevel::Value, value.grants.as_slice(), value.kas_keys.as_slice())];
    if let Some(def) = definition {
        levels.push((GrantLevel::Definition, def.grants.as_slice(), def.kas_keys.as_slice()));
        if let Some(ns) = def.namespace.as_ref() {
            levels.push((GrantLevel::Namespace, ns.grants.as_slice(), ns.kas_keys.as_slice()));
        }
    }

    for (level, grants, kas_keys) in levels {
        if has_valid_grants(grants, kas_keys) {
            let grants = extract_kas_grants(grants, kas_keys);
            debug!(
                fqn = %value.fqn,
                level = %level,
                count = grants.len(),
                "resolved KAS grants"
            );
            return Ok(ResolvedGrants {
                level,
                attribute: definition.cloned(),
                grants,
            });
        }
    }

    Err(KeySplitError::NoKasFound {
        fqn: value.fqn.clone(),
    })
}

/// True if a level carries a mapped key with material or a legacy grant with a URI
pub fn has_valid_grants(grants: &[KeyAccessServer], kas_keys: &[SimpleKasKey]) -> bool {
    kas_keys.iter().any(is_usable_mapped_key) || grants.iter().any(|g| !g.uri.is_empty())
}

/// Flatten one level's grants into [`KasGrant`]s, deduplicated by URL
pub fn extract_kas_grants(grants: &[KeyAccessServer], kas_keys: &[SimpleKasKey]) -> Vec<KasGrant> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    if kas_keys.iter().any(is_usable_mapped_key) {
        for key in kas_keys.iter().filter(|k| is_usable_mapped_key(k)) {
            if seen.insert(key.kas_uri.clone()) {
                out.push(KasGrant::new(key.kas_uri.clone(), key.public_key.clone()));
            }
        }
        return out;
    }

    for grant in grants.iter().filter(|g| !g.uri.is_empty()) {
        if seen.insert(grant.uri.clone()) {
            out.push(KasGrant::new(grant.uri.clone(), legacy_public_key(grant)));
        }
    }
    out
}

fn is_usable_mapped_key(key: &SimpleKasKey) -> bool {
    !key.kas_uri.is_empty() && key.public_key.is_some()
}

/// Nested mapped key first, then the first cached key
fn legacy_public_key(grant: &KeyAccessServer) -> Option<SimpleKasPublicKey> {
    if let Some(key) = grant.kas_keys.iter().find_map(|k| k.public_key.as_ref()) {
        return Some(key.clone());
    }

    grant.cached_keys.first().map(|cached| {
        SimpleKasPublicKey::new(cached.alg.to_algorithm(), cached.kid.clone(), cached.pem.clone())
    })
}
