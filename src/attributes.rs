//! Human-readable presentation of raw identity attributes.
//!
//! Stores hand over an attribute map per identity. [`present`] turns it into
//! `(label, value)` rows: recognised attributes first in a fixed order, then
//! anything else as "Unrecognized Attribute".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label used for attribute keys with no known meaning.
pub const UNRECOGNIZED_ATTRIBUTE: &str = "Unrecognized Attribute";
/// Value used when a value cannot be rendered for its attribute.
pub const UNRECOGNIZED_VALUE: &str = "Unrecognized Value";

/// A raw attribute value as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AttributeValue {
    Text(String),
    Number(i64),
    Bool(bool),
    Data(Vec<u8>),
}

/// Raw attribute set keyed by attribute name.
pub type Attributes = BTreeMap<String, AttributeValue>;

#[derive(Debug, Clone, Copy)]
enum Format {
    Text,
    Hex,
    YesNo,
    Number,
    CertificateType,
    CertificateEncoding,
    KeyClass,
    KeyType,
    Tag,
}

/// Recognised attributes in presentation order.
const RECOGNIZED: &[(&str, &str, Format)] = &[
    ("accessible", "Accessible", Format::Text),
    ("access_group", "Access group", Format::Text),
    ("certificate_type", "Certificate type", Format::CertificateType),
    (
        "certificate_encoding",
        "Certificate encoding",
        Format::CertificateEncoding,
    ),
    ("label", "Label", Format::Text),
    ("subject", "Certificate Subject", Format::Hex),
    ("issuer", "Certificate Issuer", Format::Hex),
    ("serial_number", "Serial number", Format::Hex),
    ("subject_key_id", "Subject key ID", Format::Hex),
    ("public_key_hash", "Public key hash", Format::Hex),
    ("key_class", "Key class", Format::KeyClass),
    ("application_label", "Application label", Format::Hex),
    ("is_permanent", "Is permanent", Format::YesNo),
    ("application_tag", "Application tag", Format::Tag),
    ("key_type", "Key type", Format::KeyType),
    ("key_size_in_bits", "Key size in bits", Format::Number),
    ("effective_key_size", "Effective key size", Format::Number),
    ("can_encrypt", "Can encrypt", Format::YesNo),
    ("can_decrypt", "Can decrypt", Format::YesNo),
    ("can_derive", "Can derive", Format::YesNo),
    ("can_sign", "Can sign", Format::YesNo),
    ("can_verify", "Can verify", Format::YesNo),
    ("can_wrap", "Can wrap", Format::YesNo),
    ("can_unwrap", "Can unwrap", Format::YesNo),
];

/// Returns the friendly name for an attribute key, if it is recognised.
pub fn friendly_name(key: &str) -> Option<&'static str> {
    RECOGNIZED
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, name, _)| *name)
}

/// Produces one `(label, value)` row per attribute in `attrs`.
pub fn present(attrs: &Attributes) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = RECOGNIZED
        .iter()
        .filter_map(|(key, name, format)| {
            attrs
                .get(*key)
                .map(|value| (name.to_string(), render(*format, value)))
        })
        .collect();

    for key in attrs.keys() {
        if friendly_name(key).is_none() {
            log::debug!("Unrecognized attribute '{}'", key);
            rows.push((
                UNRECOGNIZED_ATTRIBUTE.to_string(),
                UNRECOGNIZED_VALUE.to_string(),
            ));
        }
    }

    rows
}

fn render(format: Format, value: &AttributeValue) -> String {
    use AttributeValue::*;

    match (format, value) {
        (Format::Text, Text(s)) => s.clone(),
        (Format::Hex, Data(bytes)) => hex::encode(bytes),
        (Format::YesNo, Bool(b)) => yes_no(*b).to_string(),
        // some stores report booleans as numbers
        (Format::YesNo, Number(n)) => yes_no(*n != 0).to_string(),
        (Format::Number, Number(n)) => n.to_string(),
        (Format::CertificateType, Number(n)) => match n {
            1..=3 => format!("X509v{}", n),
            _ => "Unrecognized certificate type".to_string(),
        },
        (Format::CertificateEncoding, Number(3)) => "DER".to_string(),
        (Format::CertificateEncoding, Number(_)) => {
            "Unrecognized certificate encoding".to_string()
        }
        (Format::KeyClass, Number(n)) => match n {
            0 => "Public key",
            1 => "Private key",
            2 => "Symmetric key",
            _ => "Unrecognized key class",
        }
        .to_string(),
        (Format::KeyType, Number(n)) => match n {
            42 => "RSA",
            73 => "Elliptic curve",
            _ => "Unrecognized key type",
        }
        .to_string(),
        (Format::Tag, Data(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        (Format::Tag, Text(s)) => s.clone(),
        _ => UNRECOGNIZED_VALUE.to_string(),
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}
