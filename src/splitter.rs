//! XOR secret splitting and the end-to-end split pipeline
//!
//! A DEK split into N shares is recovered only by XOR-ing all N together.
//! N-1 shares are drawn from a [`KeySource`] and the last one is the
//! remainder, so any N-1 shares are indistinguishable from random.
//!
//! # Example
//!
//! ```
//! use opentdf_keysplit::{SimpleKasKey, XorSplitter};
//!
//! let splitter =
//!     XorSplitter::new().with_default_kas(SimpleKasKey::uri_only("https://kas.example.com/"));
//! let result = splitter.generate_splits(&[], &[7u8; 32])?;
//! assert_eq!(result.splits.len(), 1);
//! assert_eq!(result.splits[0].data, vec![7u8; 32]);
//! # Ok::<(), opentdf_keysplit::KeySplitError>(())
//! ```

use crate::config::SplitterConfig;
use crate::error::{KeySourceError, KeySplitError};
use crate::expression::build_boolean_expression;
use crate::optimizer::optimize_split_assignments;
use crate::planner::{create_default_split_plan, create_split_plan, SplitAssignment};
use crate::policy::{Algorithm, AttributeValue, SimpleKasKey, SimpleKasPublicKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

/// Required DEK length in bytes (AES-256)
pub const DEK_SIZE: usize = 32;

/// Source of random share material
pub trait KeySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), KeySourceError>;
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsKeySource;

impl KeySource for OsKeySource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), KeySourceError> {
        OsRng.try_fill_bytes(dest)?;
        Ok(())
    }
}

/// One XOR share of the DEK and the KAS servers it is wrapped for
#[derive(Clone, PartialEq, Eq)]
pub struct Split {
    pub id: String,
    pub data: Vec<u8>,
    pub kas_urls: Vec<String>,
}

impl fmt::Debug for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Split")
            .field("id", &self.id)
            .field("data", &format_args!("[{} bytes redacted]", self.data.len()))
            .field("kas_urls", &self.kas_urls)
            .finish()
    }
}

/// Public key to wrap splits for one KAS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KasPublicKey {
    pub url: String,
    pub kid: String,
    pub pem: String,
    pub algorithm: String,
}

impl KasPublicKey {
    pub fn from_simple(url: impl Into<String>, key: &SimpleKasPublicKey) -> Self {
        Self {
            url: url.into(),
            kid: key.kid.clone(),
            pem: key.pem.clone(),
            algorithm: format_algorithm(key.algorithm).to_string(),
        }
    }
}

/// Splits plus the public keys needed to wrap them
#[derive(Debug, Clone, Default)]
pub struct SplitResult {
    pub splits: Vec<Split>,
    pub kas_public_keys: HashMap<String, KasPublicKey>,
}

/// Compiles attribute policies into XOR key splits
#[derive(Clone)]
pub struct XorSplitter {
    config: SplitterConfig,
    key_source: Arc<dyn KeySource>,
}

impl fmt::Debug for XorSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XorSplitter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for XorSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl XorSplitter {
    /// Splitter with no default KAS, drawing shares from the OS
    pub fn new() -> Self {
        Self::from_config(SplitterConfig::default())
    }

    pub fn from_config(config: SplitterConfig) -> Self {
        Self {
            config,
            key_source: Arc::new(OsKeySource),
        }
    }

    #[must_use]
    pub fn with_default_kas(mut self, kas: SimpleKasKey) -> Self {
        self.config.default_kas = Some(kas);
        self
    }

    /// Replace the random source used for shares
    #[must_use]
    pub fn with_key_source(mut self, source: impl KeySource + 'static) -> Self {
        self.key_source = Arc::new(source);
        self
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Plan and produce key splits for `attributes`
    ///
    /// With no attributes, or when no attribute resolves to a KAS, the DEK is
    /// wrapped for the default KAS alone. Without a default KAS that case is
    /// an error.
    pub fn generate_splits(
        &self,
        attributes: &[AttributeValue],
        dek: &[u8],
    ) -> Result<SplitResult, KeySplitError> {
        validate_dek(dek)?;

        let default_kas = self.config.default_kas_uri();
        let plan = if attributes.is_empty() {
            debug!("no attributes in policy, using default KAS");
            create_default_split_plan(default_kas)
        } else {
            let expression = build_boolean_expression(attributes)?;
            create_split_plan(&expression, default_kas)?
        };

        if plan.is_empty() {
            return Err(KeySplitError::NoDefaultKas);
        }

        let plan = optimize_split_assignments(plan);
        let splits = self.split_dek(dek, &plan)?;

        let mut kas_public_keys = collect_all_public_keys(&plan);
        self.merge_default_kas_key(&splits, &mut kas_public_keys);

        debug!(
            splits = splits.len(),
            keys = kas_public_keys.len(),
            "generated key splits"
        );
        Ok(SplitResult {
            splits,
            kas_public_keys,
        })
    }

    /// XOR-split `dek` into one share per assignment
    pub fn split_dek(
        &self,
        dek: &[u8],
        assignments: &[SplitAssignment],
    ) -> Result<Vec<Split>, KeySplitError> {
        validate_dek(dek)?;

        let Some((last, rest)) = assignments.split_last() else {
            return Err(KeySplitError::NoSplitsGenerated);
        };

        if rest.is_empty() {
            return Ok(vec![Split {
                id: last.split_id.clone(),
                data: dek.to_vec(),
                kas_urls: last.kas_urls.clone(),
            }]);
        }

        let mut remainder = Zeroizing::new(dek.to_vec());
        let mut shares: Vec<Zeroizing<Vec<u8>>> = Vec::with_capacity(assignments.len());

        for _ in rest {
            let mut share = Zeroizing::new(vec![0u8; dek.len()]);
            self.key_source
                .fill(&mut share)
                .map_err(|e| KeySplitError::SplitGeneration {
                    reason: "failed to generate random share".to_string(),
                    source: Some(e),
                })?;
            xor_into(&mut remainder, &share);
            shares.push(share);
        }
        shares.push(remainder);

        verify_reconstruction(dek, &shares)?;

        Ok(assignments
            .iter()
            .zip(shares.iter())
            .map(|(assignment, share)| Split {
                id: assignment.split_id.clone(),
                data: share.to_vec(),
                kas_urls: assignment.kas_urls.clone(),
            })
            .collect())
    }

    fn merge_default_kas_key(&self, splits: &[Split], keys: &mut HashMap<String, KasPublicKey>) {
        let Some(default) = self.config.default_kas.as_ref() else {
            return;
        };
        let Some(public_key) = default.public_key.as_ref() else {
            return;
        };
        if default.kas_uri.is_empty() || keys.contains_key(&default.kas_uri) {
            return;
        }

        if splits.iter().any(|s| s.kas_urls.contains(&default.kas_uri)) {
            debug!(kas = %default.kas_uri, "adding default KAS public key");
            keys.insert(
                default.kas_uri.clone(),
                KasPublicKey::from_simple(default.kas_uri.clone(), public_key),
            );
        }
    }
}

/// Public keys across all assignments; the first key seen for a URL wins
pub fn collect_all_public_keys(assignments: &[SplitAssignment]) -> HashMap<String, KasPublicKey> {
    let mut keys = HashMap::new();
    for assignment in assignments {
        for (url, key) in &assignment.keys {
            keys.entry(url.clone())
                .or_insert_with(|| KasPublicKey::from_simple(url.clone(), key));
        }
    }
    keys
}

/// Key-access algorithm tag for `alg`
pub fn format_algorithm(alg: Algorithm) -> &'static str {
    alg.as_str()
}

fn validate_dek(dek: &[u8]) -> Result<(), KeySplitError> {
    if dek.is_empty() {
        return Err(KeySplitError::EmptyDek);
    }
    if dek.len() != DEK_SIZE {
        return Err(KeySplitError::InvalidDek {
            expected: DEK_SIZE,
            got: dek.len(),
        });
    }
    Ok(())
}

fn xor_into(acc: &mut [u8], share: &[u8]) {
    for (a, s) in acc.iter_mut().zip(share) {
        *a ^= s;
    }
}

fn verify_reconstruction(dek: &[u8], shares: &[Zeroizing<Vec<u8>>]) -> Result<(), KeySplitError> {
    let mut reconstructed = Zeroizing::new(vec![0u8; dek.len()]);
    for share in shares {
        xor_into(&mut reconstructed, share);
    }

    if bool::from(reconstructed.as_slice().ct_eq(dek)) {
        Ok(())
    } else {
        Err(KeySplitError::SplitGeneration {
            reason: "XOR reconstruction does not match DEK".to_string(),
            source: None,
        })
    }
}
