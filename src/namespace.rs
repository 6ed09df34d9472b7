//! Projection of a credential snapshot into virtual nodes.
//!
//! Everything here is a pure function of its inputs: the same snapshot and
//! password always yield the same tree (modulo creation dates for credentials
//! without a `not_before`).

use chrono::{DateTime, Utc};

use crate::classifier;
use crate::credential::Credential;
use crate::filter::{Filter, Presentation, ROOT_CONTENT_TYPE, ROOT_LEAF_CONTENT_TYPE};
use crate::identifier::Identifier;
use crate::package;

/// Display name of the namespace root.
pub const ROOT_DISPLAY_NAME: &str = "Key Sharing";

/// Variant data of a [`VirtualNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A folder; `None` is the namespace root.
    Folder { filter: Option<Filter> },
    ZipFile { filter: Filter, size_bytes: u64 },
    LeafFile {
        credential_id: String,
        size_bytes: u64,
        creation_date: DateTime<Utc>,
    },
}

/// One entry of the projected hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualNode {
    pub identifier: Identifier,
    /// `None` only for the namespace root.
    pub parent: Option<Identifier>,
    pub display_name: String,
    pub content_type: String,
    pub kind: NodeKind,
}

impl VirtualNode {
    /// The encoded identifier string.
    pub fn id(&self) -> String {
        self.identifier.encode()
    }

    pub fn size_bytes(&self) -> Option<u64> {
        match self.kind {
            NodeKind::ZipFile { size_bytes, .. } | NodeKind::LeafFile { size_bytes, .. } => {
                Some(size_bytes)
            }
            NodeKind::Folder { .. } => None,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }
}

pub fn root_node() -> VirtualNode {
    VirtualNode {
        identifier: Identifier::Root,
        parent: None,
        display_name: ROOT_DISPLAY_NAME.to_string(),
        content_type: ROOT_CONTENT_TYPE.to_string(),
        kind: NodeKind::Folder { filter: None },
    }
}

pub fn folder_node(filter: Filter) -> VirtualNode {
    let identifier = Identifier::Folder(filter);
    VirtualNode {
        parent: identifier.parent(),
        identifier,
        display_name: filter.folder_name().to_string(),
        content_type: filter.content_type(Presentation::Folder),
        kind: NodeKind::Folder {
            filter: Some(filter),
        },
    }
}

/// The zip node for `filter`, or `None` when the archive cannot be assembled.
pub fn zip_node(credentials: &[Credential], filter: Filter, password: &str) -> Option<VirtualNode> {
    let selected = classifier::select(credentials, filter);
    let archive = match package::build_archive(selected, password) {
        Ok(archive) => archive,
        Err(e) => {
            log::error!("Omitting zip node for {}: {}", filter, e);
            return None;
        }
    };

    let identifier = Identifier::Zip(filter);
    Some(VirtualNode {
        parent: identifier.parent(),
        display_name: identifier.encode(),
        identifier,
        content_type: filter.content_type(Presentation::Zip),
        kind: NodeKind::ZipFile {
            filter,
            size_bytes: archive.len() as u64,
        },
    })
}

/// The leaf for `credential` under `folder` (or the root), or `None` when no
/// container can be built for it.
pub fn leaf_node(
    credential: &Credential,
    folder: Option<Filter>,
    password: &str,
) -> Option<VirtualNode> {
    let container = match package::build_container(credential, password) {
        Ok(container) => container,
        Err(e) => {
            log::warn!(
                "Omitting leaf for '{}' ({}, serial {:?}) under {}: {}",
                credential.id,
                credential.category,
                credential.serial,
                folder.map_or("root", |f| f.folder_name()),
                e
            );
            return None;
        }
    };

    let (identifier, content_type) = match folder {
        Some(filter) => (
            Identifier::folder_leaf(filter, credential.id.as_str()),
            filter.leaf_content_type(),
        ),
        None => (
            Identifier::root_leaf(credential.id.as_str()),
            ROOT_LEAF_CONTENT_TYPE.to_string(),
        ),
    };

    Some(VirtualNode {
        parent: identifier.parent(),
        identifier,
        display_name: container.filename,
        content_type,
        kind: NodeKind::LeafFile {
            credential_id: credential.id.clone(),
            size_bytes: container.bytes.len() as u64,
            creation_date: creation_date(credential.not_before),
        },
    })
}

/// `not_before` as a UTC date-time, or now when it is unavailable.
pub fn creation_date(not_before: i64) -> DateTime<Utc> {
    if not_before == 0 {
        return Utc::now();
    }
    DateTime::from_timestamp(not_before, 0).unwrap_or_else(Utc::now)
}

/// Projects one view.
///
/// Folder presentation yields the folder followed by its leaves; zip
/// presentation yields the single zip node.
pub fn project(
    credentials: &[Credential],
    filter: Filter,
    presentation: Presentation,
    password: &str,
) -> Vec<VirtualNode> {
    match presentation {
        Presentation::Folder => {
            let mut nodes = vec![folder_node(filter)];
            nodes.extend(folder_leaves(credentials, filter, password));
            nodes
        }
        Presentation::Zip => zip_node(credentials, filter, password).into_iter().collect(),
    }
}

/// Leaves of the folder for `filter`.
pub fn folder_leaves(credentials: &[Credential], filter: Filter, password: &str) -> Vec<VirtualNode> {
    classifier::select(credentials, filter)
        .into_iter()
        .filter_map(|credential| leaf_node(credential, Some(filter), password))
        .collect()
}

/// Every identity once, directly under the root, without category filtering.
pub fn project_identities(credentials: &[Credential], password: &str) -> Vec<VirtualNode> {
    credentials
        .iter()
        .filter_map(|credential| leaf_node(credential, None, password))
        .collect()
}

/// Everything under the root: identities, then each folder with its leaves,
/// then each zip.
pub fn enumerate_root(credentials: &[Credential], password: &str) -> Vec<VirtualNode> {
    let mut nodes = project_identities(credentials, password);
    for filter in Filter::ALL {
        nodes.extend(project(credentials, filter, Presentation::Folder, password));
    }
    for filter in Filter::ALL {
        nodes.extend(project(credentials, filter, Presentation::Zip, password));
    }
    log::debug!(
        "Projected {} nodes from {} credentials",
        nodes.len(),
        credentials.len()
    );
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Category;

    fn der(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0x30, payload.len() as u8];
        out.extend_from_slice(payload);
        out
    }

    fn cred(id: &str, category: Category, not_before: i64) -> Credential {
        Credential::new(
            Some(id),
            category,
            not_before,
            Some(format!("{}-serial", id)),
            der(id.as_bytes()),
            der(b"key"),
        )
    }

    #[test]
    fn test_folder_projection() {
        let store = vec![
            cred("auth", Category::Authentication, 100),
            cred("sig", Category::Signature, 50),
        ];
        let nodes = project(&store, Filter::All, Presentation::Folder, "pw");
        let ids: Vec<String> = nodes.iter().map(VirtualNode::id).collect();
        assert_eq!(ids, vec!["All", "All.sig", "All.auth"]);

        assert_eq!(nodes[0].content_type, "purebred2025.select.all");
        assert_eq!(nodes[0].parent, Some(Identifier::Root));
        for leaf in &nodes[1..] {
            assert_eq!(leaf.parent, Some(Identifier::Folder(Filter::All)));
            assert_eq!(leaf.content_type, "purebred2025.select.all-p12");
        }
        assert_eq!(nodes[2].display_name, "piv_auth-serial.p12");
    }

    #[test]
    fn test_empty_folder_and_zip_still_emitted() {
        let nodes = project(&[], Filter::Device, Presentation::Folder, "pw");
        assert_eq!(nodes, vec![folder_node(Filter::Device)]);

        let nodes = project(&[], Filter::Device, Presentation::Zip, "pw");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id(), "Device.zip");
        assert!(nodes[0].size_bytes().unwrap() > 0);
    }

    #[test]
    fn test_zip_size_matches_archive() {
        let store = vec![
            cred("enc1", Category::Encryption, 1),
            cred("enc2", Category::Encryption, 2),
        ];
        let node = zip_node(&store, Filter::Encryption, "pw").unwrap();
        let archive =
            package::build_archive(classifier::select(&store, Filter::Encryption), "pw").unwrap();
        assert_eq!(node.size_bytes(), Some(archive.len() as u64));
        assert_eq!(node.content_type, "purebred2025.zip.encryption");
        assert_eq!(node.parent, Some(Identifier::Root));
    }

    #[test]
    fn test_malformed_credential_omitted() {
        let mut bad = cred("bad", Category::Device, 1);
        bad.private_key.clear();
        let store = vec![bad, cred("good", Category::Encryption, 1)];

        let leaves = project_identities(&store, "pw");
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].id(), "good");
        assert_eq!(leaves[0].content_type, ROOT_LEAF_CONTENT_TYPE);
    }

    #[test]
    fn test_root_enumeration_order() {
        let store = vec![cred("auth", Category::Authentication, 1)];
        let ids: Vec<String> = enumerate_root(&store, "pw").iter().map(VirtualNode::id).collect();
        assert_eq!(
            ids,
            vec![
                "auth",
                "All User",
                "All User.auth",
                "All",
                "All.auth",
                "PIV",
                "PIV.auth",
                "Signature",
                "Encryption",
                "Device",
                "Unfiltered",
                "Unfiltered.auth",
                "All User.zip",
                "All.zip",
                "PIV.zip",
                "Signature.zip",
                "Encryption.zip",
                "Device.zip",
                "Unfiltered.zip",
            ]
        );
    }

    #[test]
    fn test_identifiers_decode_to_declared_parent() {
        let store = vec![
            cred("a.b", Category::Signature, 1),
            cred("zip", Category::Device, 1),
            cred("All", Category::Encryption, 1),
        ];
        for node in enumerate_root(&store, "pw") {
            let decoded = Identifier::decode(&node.id()).unwrap();
            assert_eq!(decoded.parent(), node.parent);
            if let NodeKind::LeafFile { credential_id, .. } = &node.kind {
                assert_eq!(decoded.credential_id(), Some(credential_id.as_str()));
            }
        }
    }

    #[test]
    fn test_creation_date() {
        assert_eq!(creation_date(100).timestamp(), 100);
        let before = Utc::now();
        assert!(creation_date(0) >= before);
    }
}
