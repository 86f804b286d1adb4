//! Attribute policy data model
//!
//! These types mirror the objects served by the OpenTDF policy service:
//! namespaces own attribute definitions, definitions own values, and any of the
//! three levels may carry KAS grants. The split engine only reads them.
//!
//! Definitions and namespaces are shared through [`Arc`] so that many values
//! can point at the same definition without copying grant lists.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Rule governing how the values of one attribute definition combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeRule {
    /// No rule set on the definition; planned like `allOf`
    #[default]
    Unspecified,
    AllOf,
    AnyOf,
    Hierarchy,
    /// A rule code this engine does not understand
    Unknown(i32),
}

impl AttributeRule {
    /// Build a rule from its policy-service enum code
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => AttributeRule::Unspecified,
            1 => AttributeRule::AllOf,
            2 => AttributeRule::AnyOf,
            3 => AttributeRule::Hierarchy,
            other => AttributeRule::Unknown(other),
        }
    }

    /// The policy-service enum code for this rule
    pub fn code(&self) -> i32 {
        match self {
            AttributeRule::Unspecified => 0,
            AttributeRule::AllOf => 1,
            AttributeRule::AnyOf => 2,
            AttributeRule::Hierarchy => 3,
            AttributeRule::Unknown(code) => *code,
        }
    }

    /// Short name used in expression rendering
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeRule::Unspecified => "unspecified",
            AttributeRule::AllOf => "allOf",
            AttributeRule::AnyOf => "anyOf",
            AttributeRule::Hierarchy => "hierarchy",
            AttributeRule::Unknown(_) => "unknown",
        }
    }

    /// Returns false for rule codes outside the known set
    pub fn is_supported(&self) -> bool {
        !matches!(self, AttributeRule::Unknown(_))
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "unspecified" | "ATTRIBUTE_RULE_TYPE_ENUM_UNSPECIFIED" => {
                Some(AttributeRule::Unspecified)
            }
            "allOf" | "ATTRIBUTE_RULE_TYPE_ENUM_ALL_OF" => Some(AttributeRule::AllOf),
            "anyOf" | "ATTRIBUTE_RULE_TYPE_ENUM_ANY_OF" => Some(AttributeRule::AnyOf),
            "hierarchy" | "ATTRIBUTE_RULE_TYPE_ENUM_HIERARCHY" => Some(AttributeRule::Hierarchy),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AttributeRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeRule::Unknown(code) => serializer.serialize_i32(*code),
            known => serializer.serialize_str(known.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for AttributeRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RuleRepr {
            Code(i32),
            Name(String),
        }

        match RuleRepr::deserialize(deserializer)? {
            RuleRepr::Code(code) => Ok(AttributeRule::from_code(code)),
            RuleRepr::Name(name) => AttributeRule::from_name(&name).ok_or_else(|| {
                serde::de::Error::custom(format!("unknown attribute rule '{}'", name))
            }),
        }
    }
}

/// Public key algorithm attached to a mapped KAS key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "rsa:2048")]
    Rsa2048,
    #[serde(rename = "rsa:4096")]
    Rsa4096,
    #[serde(rename = "ec:secp256r1")]
    EcP256,
    #[serde(rename = "ec:secp384r1")]
    EcP384,
    #[serde(rename = "ec:secp521r1")]
    EcP521,
    #[default]
    #[serde(rename = "unspecified", other)]
    Unspecified,
}

impl Algorithm {
    /// Key-access algorithm tag, `unknown` when unspecified
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Rsa2048 => "rsa:2048",
            Algorithm::Rsa4096 => "rsa:4096",
            Algorithm::EcP256 => "ec:secp256r1",
            Algorithm::EcP384 => "ec:secp384r1",
            Algorithm::EcP521 => "ec:secp521r1",
            Algorithm::Unspecified => "unknown",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Algorithm enum used by cached keys on legacy KAS registrations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KasPublicKeyAlgEnum {
    Rsa2048,
    Rsa4096,
    EcSecp256r1,
    EcSecp384r1,
    EcSecp521r1,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl KasPublicKeyAlgEnum {
    /// Map the legacy enum onto [`Algorithm`]
    pub fn to_algorithm(self) -> Algorithm {
        match self {
            KasPublicKeyAlgEnum::Rsa2048 => Algorithm::Rsa2048,
            KasPublicKeyAlgEnum::Rsa4096 => Algorithm::Rsa4096,
            KasPublicKeyAlgEnum::EcSecp256r1 => Algorithm::EcP256,
            KasPublicKeyAlgEnum::EcSecp384r1 => Algorithm::EcP384,
            KasPublicKeyAlgEnum::EcSecp521r1 => Algorithm::EcP521,
            KasPublicKeyAlgEnum::Unspecified => Algorithm::Unspecified,
        }
    }
}

/// Public key material of a KAS
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleKasPublicKey {
    #[serde(default)]
    pub algorithm: Algorithm,
    #[serde(default)]
    pub kid: String,
    #[serde(default)]
    pub pem: String,
}

impl SimpleKasPublicKey {
    pub fn new(algorithm: Algorithm, kid: impl Into<String>, pem: impl Into<String>) -> Self {
        Self {
            algorithm,
            kid: kid.into(),
            pem: pem.into(),
        }
    }
}

/// A KAS URL mapped to a specific public key
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleKasKey {
    #[serde(default)]
    pub kas_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<SimpleKasPublicKey>,
}

impl SimpleKasKey {
    /// A mapped key with embedded public key material
    pub fn new(kas_uri: impl Into<String>, public_key: SimpleKasPublicKey) -> Self {
        Self {
            kas_uri: kas_uri.into(),
            public_key: Some(public_key),
        }
    }

    /// A KAS reference without key material
    pub fn uri_only(kas_uri: impl Into<String>) -> Self {
        Self {
            kas_uri: kas_uri.into(),
            public_key: None,
        }
    }
}

/// Key cached on a legacy KAS registration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedKasKey {
    #[serde(default)]
    pub kid: String,
    #[serde(default)]
    pub pem: String,
    #[serde(default)]
    pub alg: KasPublicKeyAlgEnum,
}

/// Legacy KAS grant, referencing a server by URI
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAccessServer {
    #[serde(default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kas_keys: Vec<SimpleKasKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cached_keys: Vec<CachedKasKey>,
}

impl KeyAccessServer {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_kas_key(mut self, key: SimpleKasKey) -> Self {
        self.kas_keys.push(key);
        self
    }

    #[must_use]
    pub fn with_cached_key(mut self, key: CachedKasKey) -> Self {
        self.cached_keys.push(key);
        self
    }
}

/// Attribute namespace, e.g. `https://example.com`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fqn: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<KeyAccessServer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kas_keys: Vec<SimpleKasKey>,
}

impl Namespace {
    pub fn new(fqn: impl Into<String>) -> Self {
        let fqn = fqn.into();
        let name = fqn
            .split_once("://")
            .map(|(_, authority)| authority.to_string())
            .unwrap_or_else(|| fqn.clone());
        Self {
            name,
            fqn,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_grant(mut self, grant: KeyAccessServer) -> Self {
        self.grants.push(grant);
        self
    }

    #[must_use]
    pub fn with_kas_key(mut self, key: SimpleKasKey) -> Self {
        self.kas_keys.push(key);
        self
    }
}

/// Attribute definition, e.g. `https://example.com/attr/Department`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fqn: String,
    #[serde(default)]
    pub rule: AttributeRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Arc<Namespace>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<KeyAccessServer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kas_keys: Vec<SimpleKasKey>,
}

impl AttributeDefinition {
    pub fn new(fqn: impl Into<String>, rule: AttributeRule) -> Self {
        let fqn = fqn.into();
        let name = fqn
            .rsplit_once("/attr/")
            .map(|(_, name)| name.to_string())
            .unwrap_or_default();
        Self {
            name,
            fqn,
            rule,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: Arc<Namespace>) -> Self {
        self.namespace = Some(namespace);
        self
    }

    #[must_use]
    pub fn with_grant(mut self, grant: KeyAccessServer) -> Self {
        self.grants.push(grant);
        self
    }

    #[must_use]
    pub fn with_kas_key(mut self, key: SimpleKasKey) -> Self {
        self.kas_keys.push(key);
        self
    }
}

/// A single attribute value in a data policy
///
/// `fqn` has the form `https://<authority>/attr/<name>/value/<value>`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub fqn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Arc<AttributeDefinition>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grants: Vec<KeyAccessServer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kas_keys: Vec<SimpleKasKey>,
}

impl AttributeValue {
    pub fn new(fqn: impl Into<String>) -> Self {
        let fqn = fqn.into();
        let value = fqn
            .rsplit_once("/value/")
            .map(|(_, value)| value.to_string())
            .unwrap_or_default();
        Self {
            value,
            fqn,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_definition(mut self, definition: Arc<AttributeDefinition>) -> Self {
        self.attribute = Some(definition);
        self
    }

    #[must_use]
    pub fn with_grant(mut self, grant: KeyAccessServer) -> Self {
        self.grants.push(grant);
        self
    }

    #[must_use]
    pub fn with_kas_key(mut self, key: SimpleKasKey) -> Self {
        self.kas_keys.push(key);
        self
    }

    /// The definition's rule, if a definition is attached
    pub fn rule(&self) -> Option<AttributeRule> {
        self.attribute.as_ref().map(|definition| definition.rule)
    }
}
