//! Splitter configuration
//!
//! Configuration is plain data so it can be embedded in a larger SDK config
//! file and loaded with serde.
//!
//! ```
//! use opentdf_keysplit::SplitterConfig;
//!
//! let config = SplitterConfig::from_json(r#"{
//!     "defaultKas": {
//!         "kasUri": "https://kas.example.com/",
//!         "publicKey": { "algorithm": "ec:secp256r1", "kid": "e1", "pem": "PEM" }
//!     }
//! }"#)?;
//! assert_eq!(config.default_kas_uri(), Some("https://kas.example.com/"));
//! # Ok::<(), opentdf_keysplit::KeySplitError>(())
//! ```

use crate::error::KeySplitError;
use crate::policy::SimpleKasKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SplitterConfig {
    /// KAS used when the policy carries no attributes or no attribute resolves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_kas: Option<SimpleKasKey>,
}

impl SplitterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default KAS by URL only
    #[must_use]
    pub fn default_kas_url(mut self, url: impl Into<String>) -> Self {
        self.default_kas = Some(SimpleKasKey::uri_only(url));
        self
    }

    /// Set the default KAS including its public key
    #[must_use]
    pub fn default_kas(mut self, key: SimpleKasKey) -> Self {
        self.default_kas = Some(key);
        self
    }

    /// Default KAS URL, if one is configured and non-empty
    pub fn default_kas_uri(&self) -> Option<&str> {
        self.default_kas
            .as_ref()
            .map(|k| k.kas_uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    pub fn from_json(json: &str) -> Result<Self, KeySplitError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, KeySplitError> {
        Ok(serde_json::to_string(self)?)
    }
}
