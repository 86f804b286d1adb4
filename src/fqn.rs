//! Fully Qualified Name (FQN) validation for attribute values
//!
//! Attribute values are addressed by URL-shaped identifiers:
//!
//! - Definition: `https://<authority>/attr/<name>`
//! - Value: `https://<authority>/attr/<name>/value/<value>`
//!
//! The authority may carry a port and a path prefix, and plain `http` is
//! accepted. Name and value are percent-decoded; a malformed escape rejects
//! the whole FQN.
//!
//! # Example
//!
//! ```
//! use opentdf_keysplit::fqn::validate_attribute_fqn;
//!
//! let fqn = validate_attribute_fqn("https://example.com/attr/Dept/value/R%26D")?;
//! assert_eq!(fqn.authority(), "https://example.com");
//! assert_eq!(fqn.name(), "Dept");
//! assert_eq!(fqn.value(), "R&D");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use thiserror::Error;

lazy_static! {
    static ref VALUE_FQN_RE: Regex =
        Regex::new(r"^(https?://[A-Za-z0-9_./:-]+)/attr/([^/\s]*)/value/(\S*)$")
            .unwrap_or_else(|e| panic!("attribute value FQN pattern must compile: {}", e));
}

/// FQN grammar errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FqnError {
    #[error("FQN is empty")]
    Empty,

    #[error("invalid FQN format")]
    InvalidFormat,

    #[error("FQN has empty components")]
    EmptyComponents,

    #[error("invalid attribute name encoding")]
    InvalidNameEncoding,

    #[error("invalid attribute value encoding")]
    InvalidValueEncoding,
}

impl FqnError {
    /// How to repair an FQN that failed with this error
    pub fn hint(&self) -> &'static str {
        match self {
            FqnError::Empty => "Set the FQN on every attribute value",
            FqnError::InvalidFormat | FqnError::EmptyComponents => {
                "Use the form https://<authority>/attr/<name>/value/<value>"
            }
            FqnError::InvalidNameEncoding | FqnError::InvalidValueEncoding => {
                "Percent-encode reserved characters as %XX with two hex digits"
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FqnError::Empty => "FQN_E_EMPTY",
            FqnError::InvalidFormat => "FQN_E_FORMAT",
            FqnError::EmptyComponents => "FQN_E_EMPTY_COMPONENT",
            FqnError::InvalidNameEncoding => "FQN_E_NAME_ENCODING",
            FqnError::InvalidValueEncoding => "FQN_E_VALUE_ENCODING",
        }
    }
}

/// A validated attribute value FQN with decoded name and value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeValueFqn {
    authority: String,
    name: String,
    value: String,
}

impl AttributeValueFqn {
    /// Scheme and authority, e.g. `https://example.com:8443/prefix`
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Decoded attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded attribute value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// FQN of the owning attribute definition, without the value segment
    pub fn definition_fqn(&self) -> String {
        format!("{}/attr/{}", self.authority, percent_encode(&self.name))
    }
}

impl fmt::Display for AttributeValueFqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/attr/{}/value/{}",
            self.authority,
            percent_encode(&self.name),
            percent_encode(&self.value)
        )
    }
}

impl std::str::FromStr for AttributeValueFqn {
    type Err = FqnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_attribute_fqn(s)
    }
}

/// Validate an attribute value FQN and return its decoded components
pub fn validate_attribute_fqn(fqn: &str) -> Result<AttributeValueFqn, FqnError> {
    if fqn.is_empty() {
        return Err(FqnError::Empty);
    }

    let caps = VALUE_FQN_RE.captures(fqn).ok_or(FqnError::InvalidFormat)?;
    let (authority, name, value) = match (caps.get(1), caps.get(2), caps.get(3)) {
        (Some(a), Some(n), Some(v)) => (a.as_str(), n.as_str(), v.as_str()),
        _ => return Err(FqnError::InvalidFormat),
    };

    if authority.is_empty() || name.is_empty() || value.is_empty() {
        return Err(FqnError::EmptyComponents);
    }

    let name = percent_decode(name).ok_or(FqnError::InvalidNameEncoding)?;
    let value = percent_decode(value).ok_or(FqnError::InvalidValueEncoding)?;

    Ok(AttributeValueFqn {
        authority: authority.to_string(),
        name,
        value,
    })
}

/// Decode `%XX` escapes in a path segment
///
/// Returns `None` when a `%` is not followed by two hex digits. `+` is left
/// untouched. Decoded bytes that are not UTF-8 are replaced.
pub fn percent_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|b| hex_value(*b))?;
            let lo = bytes.get(i + 2).and_then(|b| hex_value(*b))?;
            out.push(hi << 4 | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    Some(String::from_utf8_lossy(&out).into_owned())
}

/// Lossy decode for display; falls back to the raw text
pub(crate) fn display_decode(s: &str) -> String {
    percent_decode(s).unwrap_or_else(|| s.to_string())
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_fqns() {
        let cases = [
            "https://example.com/attr/classification/value/secret",
            "https://example.com/attr/Dept/value/Eng",
            "http://example.com/attr/test/value/val",
            "https://example.com:8443/attr/test/value/val",
            "https://example.com/prefix/attr/test/value/val",
            "https://sub.domain.example.com/attr/test/value/val",
            "https://example.com/attr/with%20space/value/with%2Fslash",
        ];
        for fqn in cases {
            assert!(validate_attribute_fqn(fqn).is_ok(), "expected valid: {}", fqn);
        }
    }

    #[test]
    fn test_empty_fqn() {
        assert_eq!(validate_attribute_fqn(""), Err(FqnError::Empty));
    }

    #[test]
    fn test_invalid_format() {
        let cases = [
            "invalid-fqn",
            "ftp://example.com/attr/test/value/val",
            "https://example.com/attribute/test/value/val",
            "https://example.com/attr/test",
            "https://example.com/attr/a/b/value/val",
            "https://example.com/attr/test/value/with space",
        ];
        for fqn in cases {
            assert_eq!(
                validate_attribute_fqn(fqn),
                Err(FqnError::InvalidFormat),
                "expected format error: {}",
                fqn
            );
        }
    }

    #[test]
    fn test_empty_components() {
        assert_eq!(
            validate_attribute_fqn("https://example.com/attr//value/val"),
            Err(FqnError::EmptyComponents)
        );
        assert_eq!(
            validate_attribute_fqn("https://example.com/attr/test/value/"),
            Err(FqnError::EmptyComponents)
        );
    }

    #[test]
    fn test_bad_encoding() {
        assert_eq!(
            validate_attribute_fqn("https://example.com/attr/bad%ZZ/value/val"),
            Err(FqnError::InvalidNameEncoding)
        );
        assert_eq!(
            validate_attribute_fqn("https://example.com/attr/test/value/bad%ZZ"),
            Err(FqnError::InvalidValueEncoding)
        );
        assert_eq!(
            validate_attribute_fqn("https://example.com/attr/test/value/trailing%2"),
            Err(FqnError::InvalidValueEncoding)
        );
    }

    #[test]
    fn test_components() {
        let fqn = validate_attribute_fqn("https://example.com:8443/attr/test%20name/value/a+b")
            .unwrap();
        assert_eq!(fqn.authority(), "https://example.com:8443");
        assert_eq!(fqn.name(), "test name");
        assert_eq!(fqn.value(), "a+b");
        assert_eq!(
            fqn.definition_fqn(),
            "https://example.com:8443/attr/test%20name"
        );
    }

    #[test]
    fn test_display_reencodes() {
        let fqn: AttributeValueFqn = "https://example.com/attr/Dept/value/R%26D".parse().unwrap();
        assert_eq!(fqn.to_string(), "https://example.com/attr/Dept/value/R%26D");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("plain").as_deref(), Some("plain"));
        assert_eq!(percent_decode("a%2Fb").as_deref(), Some("a/b"));
        assert_eq!(percent_decode("%e2%88%80").as_deref(), Some("∀"));
        assert_eq!(percent_decode("%"), None);
        assert_eq!(percent_decode("%G0"), None);
        assert_eq!(display_decode("bad%ZZ"), "bad%ZZ");
    }

    #[test]
    fn test_error_hints() {
        assert!(FqnError::InvalidFormat.hint().contains("/attr/"));
        assert_eq!(FqnError::Empty.error_code(), "FQN_E_EMPTY");
    }
}
