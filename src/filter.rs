//! Requested views over the credential set.
//!
//! A [`Filter`] names which categories a caller wants; a [`Presentation`]
//! says whether they are surfaced as a folder of files or as one zip bundle.
//! Content-type tags are the strings a document host matches against.

use std::fmt;

use crate::credential::Category;

/// Tag of the namespace root.
pub const ROOT_CONTENT_TYPE: &str = "public.folder";
/// Tag of leaves placed directly under the root.
pub const ROOT_LEAF_CONTENT_TYPE: &str = "purebred2025.rsa.pkcs-12";

const TAG_PREFIX: &str = "purebred2025";

/// One of the fixed views a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    AllUser,
    All,
    Authentication,
    Signature,
    Encryption,
    Device,
    Unfiltered,
}

/// How a view is surfaced in the namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presentation {
    Folder,
    Zip,
}

impl Filter {
    /// Every view, in enumeration order.
    pub const ALL: [Filter; 7] = [
        Filter::AllUser,
        Filter::All,
        Filter::Authentication,
        Filter::Signature,
        Filter::Encryption,
        Filter::Device,
        Filter::Unfiltered,
    ];

    /// Folder name, which is also the first identifier segment for the view.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Filter::AllUser => "All User",
            Filter::All => "All",
            Filter::Authentication => "PIV",
            Filter::Signature => "Signature",
            Filter::Encryption => "Encryption",
            Filter::Device => "Device",
            Filter::Unfiltered => "Unfiltered",
        }
    }

    /// Inverse of [`Filter::folder_name`].
    pub fn from_folder_name(name: &str) -> Option<Filter> {
        Filter::ALL.into_iter().find(|f| f.folder_name() == name)
    }

    fn tag_suffix(&self) -> &'static str {
        match self {
            Filter::AllUser => "all-user",
            Filter::All => "all",
            Filter::Authentication => "authentication",
            Filter::Signature => "signature",
            Filter::Encryption => "encryption",
            Filter::Device => "device",
            Filter::Unfiltered => "no-filter",
        }
    }

    /// Whether a credential of `category` is requested by this view.
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Filter::Unfiltered => true,
            Filter::AllUser | Filter::All => category != Category::Unknown,
            Filter::Authentication => category == Category::Authentication,
            Filter::Signature => category == Category::Signature,
            Filter::Encryption => category == Category::Encryption,
            Filter::Device => category == Category::Device,
        }
    }

    /// Whether every match is kept without recency reduction.
    pub fn retains_all(&self) -> bool {
        matches!(self, Filter::Unfiltered)
    }

    /// Tag of the folder or zip node for this view.
    pub fn content_type(&self, presentation: Presentation) -> String {
        let kind = match presentation {
            Presentation::Folder => "select",
            Presentation::Zip => "zip",
        };
        format!("{}.{}.{}", TAG_PREFIX, kind, self.tag_suffix())
    }

    /// Tag of the leaves inside this view's folder.
    pub fn leaf_content_type(&self) -> String {
        format!("{}-p12", self.content_type(Presentation::Folder))
    }

    /// Parses a folder or zip tag back into its view.
    ///
    /// Accepts the deprecated underscore spelling `no_filter`.
    pub fn from_content_type(tag: &str) -> Option<(Filter, Presentation)> {
        let rest = tag.strip_prefix(TAG_PREFIX)?.strip_prefix('.')?;
        let (kind, suffix) = rest.split_once('.')?;
        let presentation = match kind {
            "select" => Presentation::Folder,
            "zip" => Presentation::Zip,
            _ => return None,
        };
        let suffix = if suffix == "no_filter" {
            "no-filter"
        } else {
            suffix
        };
        Filter::ALL
            .into_iter()
            .find(|f| f.tag_suffix() == suffix)
            .map(|f| (f, presentation))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}
