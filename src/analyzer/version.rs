//! HTML version detection
//!
//! The document type declaration wins when present. Without one, HTML5 is
//! inferred from sectioning elements or `data-*` attributes.

use scraper::node::Node;
use scraper::{Html, Selector};
use std::fmt;

/// Categorical HTML version of an analyzed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HtmlVersion {
    Html401,
    Xhtml10,
    Xhtml11,
    Html32,
    Html20,
    Html5,
    Unknown,
}

/// Legacy declarations in match order; the first substring hit wins
const LEGACY_DOCTYPES: [(&str, HtmlVersion); 5] = [
    ("html 4.01", HtmlVersion::Html401),
    ("xhtml 1.0", HtmlVersion::Xhtml10),
    ("xhtml 1.1", HtmlVersion::Xhtml11),
    ("html 3.2", HtmlVersion::Html32),
    ("html 2.0", HtmlVersion::Html20),
];

const HTML5_ELEMENTS: &str = "article, section, nav, header, footer, aside";

impl HtmlVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html401 => "HTML 4.01",
            Self::Xhtml10 => "XHTML 1.0",
            Self::Xhtml11 => "XHTML 1.1",
            Self::Html32 => "HTML 3.2",
            Self::Html20 => "HTML 2.0",
            Self::Html5 => "HTML5",
            Self::Unknown => "Unknown",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "HTML 4.01" => Some(Self::Html401),
            "XHTML 1.0" => Some(Self::Xhtml10),
            "XHTML 1.1" => Some(Self::Xhtml11),
            "HTML 3.2" => Some(Self::Html32),
            "HTML 2.0" => Some(Self::Html20),
            "HTML5" => Some(Self::Html5),
            "Unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for HtmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for HtmlVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Detects the HTML version of a parsed document
pub fn detect_html_version(document: &Html) -> HtmlVersion {
    match doctype_declaration(document) {
        Some(declaration) => version_from_declaration(&declaration),
        None if has_html5_markers(document) => HtmlVersion::Html5,
        None => HtmlVersion::Unknown,
    }
}

/// Matches a document type declaration against the legacy versions
///
/// A declaration that names none of them (`<!DOCTYPE html>`) is HTML5.
pub fn version_from_declaration(declaration: &str) -> HtmlVersion {
    let declaration = declaration.to_ascii_lowercase();

    LEGACY_DOCTYPES
        .iter()
        .find(|(needle, _)| declaration.contains(needle))
        .map(|(_, version)| *version)
        .unwrap_or(HtmlVersion::Html5)
}

/// Rebuilds the declaration text from the doctype node ahead of the root element
fn doctype_declaration(document: &Html) -> Option<String> {
    document
        .tree
        .root()
        .children()
        .find_map(|node| match node.value() {
            Node::Doctype(doctype) => Some(format!(
                "<!DOCTYPE {} PUBLIC \"{}\" \"{}\">",
                doctype.name(),
                doctype.public_id(),
                doctype.system_id()
            )),
            _ => None,
        })
}

fn has_html5_markers(document: &Html) -> bool {
    let has_sectioning = Selector::parse(HTML5_ELEMENTS)
        .map(|selector| document.select(&selector).next().is_some())
        .unwrap_or(false);

    has_sectioning
        || document.tree.root().descendants().any(|node| match node.value() {
            Node::Element(element) => element.attrs().any(|(name, _)| name.starts_with("data-")),
            _ => false,
        })
}
