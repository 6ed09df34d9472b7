//! Integration tests for keyshare.
//!
//! These tests drive the public API end to end: a vault on disk feeding the
//! host, projection, resolution and the shell commands.

use std::collections::BTreeSet;
use std::io::{Cursor, Read};
use std::sync::Arc;

use keyshare::attributes::AttributeValue;
use keyshare::credential::{Category, Credential};
use keyshare::error::KeyShareError;
use keyshare::filter::{Filter, Presentation};
use keyshare::host::KeyShare;
use keyshare::identifier::Identifier;
use keyshare::keychain::{IdentityRecord, Keychain};
use keyshare::namespace::NodeKind;
use keyshare::secret::{self, MemorySecretStore, SecretStore};
use keyshare::shell::command::{CommandRegistry, CommandResult, ShellContext};
use keyshare::shell::commands::register_all;
use keyshare::store::MemoryStore;
use tempfile::TempDir;

/// Wraps `payload` in a DER SEQUENCE header.
fn der(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x30, payload.len() as u8];
    out.extend_from_slice(payload);
    out
}

fn credential(id: &str, category: Category, not_before: i64, serial: &str) -> Credential {
    Credential::new(
        Some(id),
        category,
        not_before,
        Some(serial.to_string()),
        der(format!("{}-cert", id).as_bytes()),
        der(format!("{}-key", id).as_bytes()),
    )
}

fn memory_host(credentials: Vec<Credential>) -> KeyShare {
    KeyShare::new(
        Arc::new(MemoryStore::with_credentials(credentials)),
        Arc::new(MemorySecretStore::new()),
    )
}

/// Creates a vault in a temporary directory and a host over it.
fn setup_vault() -> (Arc<Keychain>, KeyShare, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let keychain = Arc::new(
        Keychain::create(temp_dir.path().join("vault.json"), "master").expect("create vault"),
    );
    let host = KeyShare::new(keychain.clone(), keychain.clone());
    (keychain, host, temp_dir)
}

fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_all(&mut registry);
    registry
}

fn zip_entries(bytes: Vec<u8>) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect()
}

// ============================================================================
// End-to-end Scenario
// ============================================================================

#[test]
fn test_scenario_auth_and_signature() {
    let host = memory_host(vec![
        credential("authId", Category::Authentication, 100, "A1"),
        credential("sigId", Category::Signature, 50, "S1"),
    ]);

    let all: Vec<String> = host
        .project(Filter::All, Presentation::Folder)
        .iter()
        .map(|n| n.id())
        .collect();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0], "All");
    assert!(all.contains(&"All.authId".to_string()));
    assert!(all.contains(&"All.sigId".to_string()));

    let piv: Vec<String> = host
        .project(Filter::Authentication, Presentation::Folder)
        .iter()
        .map(|n| n.id())
        .collect();
    assert_eq!(piv, vec!["PIV", "PIV.authId"]);

    assert_eq!(
        Identifier::decode("PIV.zip"),
        Some(Identifier::Zip(Filter::Authentication))
    );
    let bytes = host.resolve("PIV.zip").unwrap();
    assert_eq!(zip_entries(bytes), vec!["piv_A1.p12"]);
}

#[test]
fn test_zip_entry_is_valid_container() {
    let host = memory_host(vec![credential("enc", Category::Encryption, 1, "E1")]);
    let password = host.export_password();

    let bytes = host.resolve("Encryption.zip").unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name("encryption_E1.p12").unwrap();
    let mut container = Vec::new();
    entry.read_to_end(&mut container).unwrap();

    let pfx = p12::PFX::parse(&container).unwrap();
    assert!(pfx.verify_mac(&password));
    assert_eq!(pfx.key_bags(&password).unwrap(), vec![der(b"enc-key")]);
}

// ============================================================================
// Selection Through Resolution
// ============================================================================

#[test]
fn test_zip_matches_selection() {
    let host = memory_host(vec![
        credential("old-sig", Category::Signature, 10, "1"),
        credential("new-sig-a", Category::Signature, 20, "2"),
        credential("new-sig-b", Category::Signature, 20, "3"),
        credential("enc-old", Category::Encryption, 1, "4"),
        credential("enc-new", Category::Encryption, 99, "5"),
        credential("dev", Category::Device, 5, "6"),
        credential("mystery", Category::Unknown, 5, "7"),
    ]);

    assert_eq!(
        zip_entries(host.resolve("All.zip").unwrap()),
        vec![
            "encryption_4.p12",
            "encryption_5.p12",
            "device_6.p12",
            "signature_2.p12",
            "signature_3.p12",
        ]
    );
    assert_eq!(zip_entries(host.resolve("Unfiltered.zip").unwrap()).len(), 7);
    assert_eq!(
        zip_entries(host.resolve("Signature.zip").unwrap()),
        vec!["signature_2.p12", "signature_3.p12"]
    );
}

#[test]
fn test_zip_skips_malformed_credentials() {
    let mut broken = credential("broken", Category::Encryption, 1, "B");
    broken.private_key = b"garbage".to_vec();
    let host = memory_host(vec![broken, credential("fine", Category::Encryption, 1, "F")]);

    assert_eq!(
        zip_entries(host.resolve("Encryption.zip").unwrap()),
        vec!["encryption_F.p12"]
    );
    let leaves = host.enumerate("Encryption").unwrap();
    assert_eq!(leaves.len(), 1);
}

#[test]
fn test_duplicate_entry_names_are_disambiguated() {
    let host = memory_host(vec![
        credential("one", Category::Encryption, 1, "SAME"),
        credential("two", Category::Encryption, 2, "SAME"),
    ]);
    assert_eq!(
        zip_entries(host.resolve("Encryption.zip").unwrap()),
        vec!["encryption_SAME.p12", "encryption_SAME-2.p12"]
    );
}

// ============================================================================
// Namespace Consistency
// ============================================================================

#[test]
fn test_every_node_round_trips() {
    let host = memory_host(vec![
        credential("dotted.label", Category::Authentication, 3, "1"),
        credential("PIV", Category::Signature, 3, "2"),
        credential("100%", Category::Device, 3, "3"),
        credential("plain", Category::Encryption, 3, "4"),
    ]);

    for node in host.enumerate("").unwrap() {
        let id = node.id();
        let decoded = Identifier::decode(&id).expect("decodable");
        assert_eq!(decoded, node.identifier, "{}", id);
        assert_eq!(decoded.parent(), node.parent, "{}", id);

        let item = host.item(&id).unwrap();
        assert_eq!(item.display_name, node.display_name);
        assert_eq!(item.content_type, node.content_type);

        if let NodeKind::LeafFile { credential_id, .. } = &node.kind {
            assert_eq!(decoded.credential_id(), Some(credential_id.as_str()));
            assert!(host.resolve(&id).is_ok(), "{}", id);
        }
    }
}

#[test]
fn test_folders_and_zips_always_present() {
    let host = memory_host(vec![]);
    let nodes = host.enumerate("").unwrap();
    assert_eq!(nodes.len(), 2 * Filter::ALL.len());

    let folders = nodes.iter().filter(|n| n.is_folder()).count();
    assert_eq!(folders, Filter::ALL.len());
    for node in &nodes {
        assert_eq!(node.parent, Some(Identifier::Root));
    }
}

#[test]
fn test_zip_size_equals_resolved_length() {
    let host = memory_host(vec![
        credential("a", Category::Authentication, 1, "1"),
        credential("b", Category::Encryption, 1, "2"),
    ]);
    for filter in Filter::ALL {
        let id = Identifier::Zip(filter).encode();
        let node = host.item(&id).unwrap();
        let bytes = host.resolve(&id).unwrap();
        assert_eq!(node.size_bytes(), Some(bytes.len() as u64), "{}", id);
    }
}

#[test]
fn test_unknown_identifiers_are_not_found() {
    let host = memory_host(vec![credential("a", Category::Device, 1, "1")]);
    for id in ["Nowhere.a", "Device.b", "b", "Nowhere.zip", "Device"] {
        let err = host.resolve(id).unwrap_err();
        assert!(matches!(err, KeyShareError::NotFound(_)), "{}: {}", id, err);
    }
}

// ============================================================================
// Vault Tests
// ============================================================================

#[test]
fn test_vault_backs_host() {
    let (keychain, host, temp_dir) = setup_vault();
    let mut attributes = keyshare::attributes::Attributes::new();
    attributes.insert("key_size_in_bits".to_string(), AttributeValue::Number(2048));

    keychain
        .add_identity(
            IdentityRecord::new(
                Some("piv-key".to_string()),
                Category::Authentication,
                1_700_000_000,
                Some("0C".to_string()),
                &der(b"cert"),
                &der(b"key"),
            )
            .with_attributes(attributes),
        )
        .unwrap();

    let leaf = host.item("PIV.piv-key").unwrap();
    assert_eq!(leaf.display_name, "piv_0C.p12");
    match leaf.kind {
        NodeKind::LeafFile { creation_date, .. } => {
            assert_eq!(creation_date.timestamp(), 1_700_000_000)
        }
        _ => panic!("Expected a leaf"),
    }

    assert_eq!(
        host.attributes("piv-key").unwrap(),
        vec![("Key size in bits".to_string(), "2048".to_string())]
    );

    // the export password lives in the vault and survives a reopen
    let password = host.export_password();
    drop(host);
    drop(keychain);
    let reopened = Keychain::open(temp_dir.path().join("vault.json"), "master").unwrap();
    assert_eq!(
        reopened
            .get_secret(secret::SERVICE, secret::ACCOUNT)
            .unwrap()
            .as_deref(),
        Some(password.as_str())
    );
}

#[test]
fn test_password_is_stable() {
    let (_keychain, host, _temp_dir) = setup_vault();
    let first = host.export_password();
    let second = host.password_service().fetch_password();
    assert_eq!(first, second);
    assert_eq!(first.len(), secret::PASSWORD_LENGTH);
}

#[test]
fn test_wrong_master_password_is_rejected() {
    let (_keychain, _host, temp_dir) = setup_vault();
    assert!(Keychain::open(temp_dir.path().join("vault.json"), "nope").is_err());
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn test_command_workflow() {
    let (keychain, host, temp_dir) = setup_vault();
    keychain
        .add_identity(IdentityRecord::new(
            Some("sig".to_string()),
            Category::Signature,
            42,
            Some("77".to_string()),
            &der(b"cert"),
            &der(b"key"),
        ))
        .unwrap();

    let registry = create_registry();
    let mut identifiers = BTreeSet::new();
    let mut ctx = ShellContext::new(&host, &mut identifiers).with_registry(&registry);

    let ls = registry.get("ls").unwrap();
    match ls.execute(&["Signature"], &mut ctx) {
        CommandResult::Success(Some(out)) => assert!(out.contains("Signature.sig")),
        _ => panic!("Expected listing"),
    }

    let output = temp_dir.path().join("sig.p12");
    let get = registry.get("export").unwrap();
    let result = get.execute(&["Signature.sig", output.to_str().unwrap()], &mut ctx);
    assert!(matches!(result, CommandResult::Success(Some(_))));

    let password = match registry.get("pw").unwrap().execute(&[], &mut ctx) {
        CommandResult::Success(Some(pw)) => pw,
        _ => panic!("Expected password"),
    };
    let bytes = std::fs::read(&output).unwrap();
    assert!(p12::PFX::parse(&bytes).unwrap().verify_mac(&password));

    assert!(identifiers.contains("Signature.sig"));
}
