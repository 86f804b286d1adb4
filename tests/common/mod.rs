//! Shared fixtures for key split integration tests
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

pub use opentdf_keysplit::prelude::*;

pub const KAS_AU: &str = "https://kas.au/";
pub const KAS_CA: &str = "https://kas.ca/";
pub const KAS_UK: &str = "https://kas.uk/";
pub const KAS_NZ: &str = "https://kas.nz/";
pub const KAS_US: &str = "https://kas.us/";
pub const KAS_US_HCS: &str = "https://hcs.kas.us/";
pub const KAS_US_SA: &str = "https://si.kas.us/";
pub const SPECIFIED_KAS: &str = "https://attr.kas.com/";
pub const EVEN_MORE_SPECIFIC_KAS: &str = "https://value.kas.com/";
pub const LESS_SPECIFIC_KAS: &str = "https://namespace.kas.com/";

pub const MOCK_RSA_PUBLIC_KEY_1: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAtQ2ZuyT/p32SFmWTj+wQ
huQwR4IJSzlJ7CqZ4fOXw90rA2joK27dIGiHrtkQHGhS4SK1mvkYyJaREoppMFRc
AyZWCgixbSdwYJS/KN0hjLIdhtkdBlZDaZN2ayTf2sZjWzOLL2cYzzVsAy9tGL8a
bMqf91DEHv+l58fPxmbJ/i6YFFQoOEsyWnPhXdiExe6poQDCHJFYYOp6iu5kOPWr
jKFj9eGXuFR/CJQ/uxTSM+8/7Ejmi8Oa52TQAUhMPH0U1CRFm/NuiFoFissa0jJC
J3k6syxvf45mPrbtlhcELskXrquDtJOpIMQmEwfuV4j8iLNwVlsR2tAbClJi6UOy
SQIDAQAB
-----END PUBLIC KEY-----";

pub const MOCK_RSA_PUBLIC_KEY_2: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAqTQAfdLrf+Kdd+Sk8dH0
mSk57jtkdJ8TNs2VOEs1UWXj8KBOyWckzfV/vXbKWH6NuKAQ2rMGaHB4lUpZ7G30
7IAvVbFn38zGhcpsGK2PiT/LE0QNU8+ZNWB1ai0YNE4My9FYr3Kz+ow+UqzMWl70
ijPXa5tNVb8AWWvXJfzMJczVIzUAu9lUu7ZYhe3ILI4gtc9dHKvrnA5nSBOkGmtL
AZNLLMd8SyacVMMHheZmcFwfPlMwxjE+5txpE2DAVdUbPhiDevXOojXWjTqCIctL
Pg+MdeACAlGz8h3E1TrlqCTqiGXR8vhN2AmybfYn0OMOEcsLlINsgxkzDhRYA1Dv
awIDAQAB
-----END PUBLIC KEY-----";

/// Build a value with its own definition and namespace
///
/// With a non-empty `grant_kas` the value carries a legacy grant whose nested
/// mapped key holds an RSA-2048 public key with `kid`.
pub fn mock_value(fqn: &str, grant_kas: &str, kid: &str, rule: AttributeRule) -> AttributeValue {
    let (attr_fqn, _) = fqn
        .split_once("/value/")
        .unwrap_or_else(|| panic!("invalid value FQN: {}", fqn));
    let parts: Vec<&str> = attr_fqn.split('/').collect();
    assert!(parts.len() >= 5, "invalid attribute FQN: {}", attr_fqn);
    let authority = parts[..3].join("/");

    let namespace = Arc::new(Namespace::new(authority));
    let definition = Arc::new(AttributeDefinition::new(attr_fqn, rule).with_namespace(namespace));
    let value = AttributeValue::new(fqn).with_definition(definition);

    if grant_kas.is_empty() {
        return value;
    }

    value.with_grant(KeyAccessServer::new(grant_kas).with_kas_key(SimpleKasKey::new(
        grant_kas,
        SimpleKasPublicKey::new(Algorithm::Rsa2048, kid, MOCK_RSA_PUBLIC_KEY_1),
    )))
}

/// Replace the definition of `value` after editing a copy of it
pub fn edit_definition(
    mut value: AttributeValue,
    edit: impl FnOnce(&mut AttributeDefinition),
) -> AttributeValue {
    let mut definition = value
        .attribute
        .as_deref()
        .cloned()
        .expect("value has a definition");
    edit(&mut definition);
    value.attribute = Some(Arc::new(definition));
    value
}

/// Replace the namespace of `value`'s definition after editing a copy of it
pub fn edit_namespace(value: AttributeValue, edit: impl FnOnce(&mut Namespace)) -> AttributeValue {
    edit_definition(value, |definition| {
        let mut namespace = definition
            .namespace
            .as_deref()
            .cloned()
            .expect("definition has a namespace");
        edit(&mut namespace);
        definition.namespace = Some(Arc::new(namespace));
    })
}

pub fn random_dek() -> Vec<u8> {
    let mut dek = vec![0u8; DEK_SIZE];
    OsKeySource.fill(&mut dek).expect("OS random source");
    dek
}

pub fn splitter_with_default(kas: &str) -> XorSplitter {
    XorSplitter::new().with_default_kas(SimpleKasKey::uri_only(kas))
}

pub fn assert_xor_reconstructs(dek: &[u8], splits: &[Split]) {
    if let [only] = splits {
        assert_eq!(only.data, dek, "single split should contain the DEK");
        return;
    }

    let mut reconstructed = vec![0u8; dek.len()];
    for split in splits {
        for (acc, b) in reconstructed.iter_mut().zip(&split.data) {
            *acc ^= b;
        }
    }
    assert_eq!(reconstructed, dek, "XOR of all splits should equal the DEK");
}

pub fn kas_in_splits(splits: &[Split]) -> HashSet<String> {
    splits
        .iter()
        .flat_map(|s| s.kas_urls.iter().cloned())
        .collect()
}
