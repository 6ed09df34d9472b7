//! Dotted identifiers naming every node in the namespace.
//!
//! Grammar:
//!
//! ```text
//! ""                     namespace root
//! <credential-id>        leaf directly under the root
//! <folder>               folder for a view ("All", "PIV", ...)
//! <folder>.<credential>  leaf inside a folder
//! <folder>.zip           zip bundle for a view
//! ```
//!
//! Credential ids are escaped before they are placed in an identifier: `%`
//! and `.` are percent-encoded, and an id that would read as a folder name or
//! as `zip` gets its first byte percent-encoded. Decoding undoes this, so
//! every id survives a round trip.

use std::fmt;
use std::str::FromStr;

use crate::error::KeyShareError;
use crate::filter::Filter;

/// Identifier of the namespace root.
pub const ROOT_IDENTIFIER: &str = "";

const SEPARATOR: char = '.';
const ZIP_SEGMENT: &str = "zip";

/// A decoded node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Root,
    Folder(Filter),
    Zip(Filter),
    Leaf {
        /// Folder holding the leaf, `None` when it sits under the root.
        folder: Option<Filter>,
        credential_id: String,
    },
}

impl Identifier {
    /// Leaf directly under the root.
    pub fn root_leaf(credential_id: impl Into<String>) -> Self {
        Identifier::Leaf {
            folder: None,
            credential_id: credential_id.into(),
        }
    }

    /// Leaf inside the folder of `filter`.
    pub fn folder_leaf(filter: Filter, credential_id: impl Into<String>) -> Self {
        Identifier::Leaf {
            folder: Some(filter),
            credential_id: credential_id.into(),
        }
    }

    /// The identifier of the containing node, `None` for the root.
    pub fn parent(&self) -> Option<Identifier> {
        match self {
            Identifier::Root => None,
            Identifier::Folder(_) | Identifier::Zip(_) => Some(Identifier::Root),
            Identifier::Leaf { folder, .. } => {
                Some(folder.map_or(Identifier::Root, Identifier::Folder))
            }
        }
    }

    /// The credential id named by a leaf identifier.
    pub fn credential_id(&self) -> Option<&str> {
        match self {
            Identifier::Leaf { credential_id, .. } => Some(credential_id),
            _ => None,
        }
    }

    /// Encodes into the dotted string form.
    pub fn encode(&self) -> String {
        match self {
            Identifier::Root => ROOT_IDENTIFIER.to_string(),
            Identifier::Folder(filter) => filter.folder_name().to_string(),
            Identifier::Zip(filter) => {
                format!("{}{}{}", filter.folder_name(), SEPARATOR, ZIP_SEGMENT)
            }
            Identifier::Leaf {
                folder: None,
                credential_id,
            } => escape_id(credential_id),
            Identifier::Leaf {
                folder: Some(filter),
                credential_id,
            } => format!(
                "{}{}{}",
                filter.folder_name(),
                SEPARATOR,
                escape_id(credential_id)
            ),
        }
    }

    /// Decodes a dotted string, `None` if it cannot name any node.
    ///
    /// With more than two segments only the first (folder) and the last
    /// (credential) are considered.
    pub fn decode(raw: &str) -> Option<Identifier> {
        if raw == ROOT_IDENTIFIER {
            return Some(Identifier::Root);
        }

        let segments: Vec<&str> = raw.split(SEPARATOR).collect();
        let last = segments[segments.len() - 1];

        if segments.len() == 1 {
            return match Filter::from_folder_name(last) {
                Some(filter) => Some(Identifier::Folder(filter)),
                None => unescape_id(last).map(Identifier::root_leaf),
            };
        }

        if last == ZIP_SEGMENT {
            let folder = segments[segments.len() - 2];
            return Filter::from_folder_name(folder).map(Identifier::Zip);
        }

        let filter = Filter::from_folder_name(segments[0])?;
        if last.is_empty() {
            return None;
        }
        unescape_id(last).map(|id| Identifier::folder_leaf(filter, id))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Identifier {
    type Err = KeyShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::decode(s).ok_or_else(|| KeyShareError::NotFound(s.to_string()))
    }
}

fn is_reserved(segment: &str) -> bool {
    segment == ZIP_SEGMENT || Filter::from_folder_name(segment).is_some()
}

fn escape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for ch in id.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '.' => out.push_str("%2E"),
            c => out.push(c),
        }
    }

    // reserved words are ASCII, so the first byte is a whole char
    if is_reserved(&out) {
        out = format!("%{:02X}{}", out.as_bytes()[0], &out[1..]);
    }
    out
}

fn unescape_id(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
