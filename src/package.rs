//! Packaging of credentials into password-protected export files.
//!
//! A container is a PKCS #12 file holding one certificate and its private
//! key. An archive is a zip of containers. Archive assembly is partial-success:
//! a credential that cannot be packaged is logged and left out.

use p12::PFX;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::credential::Credential;
use crate::error::{KeyShareError, Result};

/// A single-credential PKCS #12 file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportContainer {
    /// `<category>_<serial>.p12`
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A zip of export containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArchive {
    pub bytes: Vec<u8>,
    /// Entry names in the order they were written.
    pub entries: Vec<String>,
}

impl ExportArchive {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Packages one credential, encrypting it under `password`.
///
/// Fails with [`KeyShareError::MalformedCredential`] when the certificate or
/// private key is missing or is not a DER SEQUENCE.
pub fn build_container(credential: &Credential, password: &str) -> Result<ExportContainer> {
    check_der_sequence(&credential.certificate)
        .map_err(|reason| KeyShareError::malformed(&credential.id, format!("certificate {}", reason)))?;
    check_der_sequence(&credential.private_key)
        .map_err(|reason| KeyShareError::malformed(&credential.id, format!("private key {}", reason)))?;

    let pfx = PFX::new(
        &credential.certificate,
        &credential.private_key,
        None,
        password,
        &credential.id,
    )
    .ok_or_else(|| KeyShareError::malformed(&credential.id, "PKCS #12 encoding failed"))?;

    let bytes = pfx.to_der();
    log::debug!(
        "Built {} byte container for '{}' ({})",
        bytes.len(),
        credential.id,
        credential.category
    );

    Ok(ExportContainer {
        filename: credential.export_filename(),
        bytes,
    })
}

/// Packages each credential and collects the results into one zip.
///
/// Entries are stored uncompressed. A name that is already taken gets a
/// `-2`, `-3`, ... suffix before `.p12`.
pub fn build_archive<'a, I>(credentials: I, password: &str) -> Result<ExportArchive>
where
    I: IntoIterator<Item = &'a Credential>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut taken: HashMap<String, String> = HashMap::new();
    let mut entries = Vec::new();

    for credential in credentials {
        let container = match build_container(credential, password) {
            Ok(container) => container,
            Err(e) => {
                log::warn!(
                    "Skipping archive entry for '{}' ({}, serial {:?}): {}",
                    credential.id,
                    credential.category,
                    credential.serial,
                    e
                );
                continue;
            }
        };

        let name = unique_entry_name(&container.filename, &credential.id, &mut taken);
        writer.start_file(name.as_str(), options)?;
        writer.write_all(&container.bytes)?;
        entries.push(name);
    }

    let bytes = writer.finish()?.into_inner();
    log::debug!(
        "Built {} byte archive with {} entries",
        bytes.len(),
        entries.len()
    );

    Ok(ExportArchive { bytes, entries })
}

fn unique_entry_name(name: &str, id: &str, taken: &mut HashMap<String, String>) -> String {
    let Some(first) = taken.get(name).cloned() else {
        taken.insert(name.to_string(), id.to_string());
        return name.to_string();
    };

    let stem = name.strip_suffix(".p12").unwrap_or(name);
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}.p12", stem, n);
        if !taken.contains_key(&candidate) {
            log::warn!(
                "Archive entry '{}' for '{}' collides with '{}', writing as '{}'",
                name,
                id,
                first,
                candidate
            );
            taken.insert(candidate.clone(), id.to_string());
            return candidate;
        }
        n += 1;
    }
}

/// Checks that `bytes` is exactly one DER SEQUENCE with a definite length.
fn check_der_sequence(bytes: &[u8]) -> std::result::Result<(), &'static str> {
    let (&tag, rest) = bytes.split_first().ok_or("is empty")?;
    if tag != 0x30 {
        return Err("is not a DER SEQUENCE");
    }

    let (&first, rest) = rest.split_first().ok_or("is truncated")?;
    let (len, body) = if first < 0x80 {
        (first as usize, rest)
    } else {
        let n = (first & 0x7f) as usize;
        if n == 0 || n > 4 {
            return Err("has an unsupported length encoding");
        }
        if rest.len() < n {
            return Err("is truncated");
        }
        let len = rest[..n]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);
        (len, &rest[n..])
    };

    if body.len() != len {
        return Err("has a length mismatch");
    }
    Ok(())
}
