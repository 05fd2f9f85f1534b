//! OpenDRIVE document reader and writer.
//!
//! The transform never re-serialises the XML tree. Instead the document is
//! parsed once with `roxmltree` to locate geometry attributes and the
//! `header/geoReference` content by byte range, and the output is produced by
//! splicing new values into the original text. Everything outside the edited
//! ranges (declaration, comments, whitespace, attribute order and quoting)
//! is carried over byte for byte.

use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::ops::Range;
use std::path::{Path, PathBuf};

use roxmltree::{Node, ParsingOptions};
use tempfile::NamedTempFile;

use crate::error::XodrError;

/// Attribute names that carry geometry.
pub const GEOMETRY_ATTRIBUTES: [&str; 5] = ["lat", "lon", "x", "y", "hdg"];

/// Decimal places used for every rewritten numeric attribute.
pub const NUMBER_PRECISION: usize = 8;

/// The parts of a document the transform needs, with byte positions into
/// the source text.
#[derive(Clone, Debug, Default)]
pub struct ScannedDocument {
    /// `header/geoReference`, if the document has exactly one.
    pub geo_reference: Option<GeoReferenceSlot>,
    /// Number of `header/geoReference` elements found.
    pub geo_reference_count: usize,
    /// Elements carrying at least one geometry attribute, in document order.
    pub elements: Vec<ScannedElement>,
    /// Total number of elements in the document.
    pub element_count: usize,
}

/// Text of the origin descriptor and where its content lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeoReferenceSlot {
    /// Concatenated text and CDATA content.
    pub text: String,
    /// Range between the end of the start tag and the start of the end tag.
    /// `None` for a self-closing element.
    pub content: Option<Range<usize>>,
    /// The element has element children, not just text.
    pub has_child_elements: bool,
}

/// An element with geometry attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedElement {
    /// XPath-like location, e.g. `/OpenDRIVE/road[2]/planView[1]/geometry[1]`.
    pub path: String,
    pub attributes: Vec<RawAttribute>,
}

impl ScannedElement {
    /// The attribute named `name`, unless it is blank.
    pub fn get(&self, name: &str) -> Option<&RawAttribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name && !attr.value.trim().is_empty())
    }
}

/// A geometry attribute as written in the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawAttribute {
    pub name: &'static str,
    /// Unescaped value.
    pub value: String,
    /// Byte range of the raw value, excluding quotes.
    pub range: Range<usize>,
}

/// A replacement of one byte range of the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }
}

/// Read a document as UTF-8 text.
pub fn read_document(path: &Path) -> Result<String, XodrError> {
    fs::read_to_string(path).map_err(|source| XodrError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a document and collect geometry attributes and the origin slot.
///
/// `path` is only used in error messages.
pub fn scan_document(source: &str, path: &Path) -> Result<ScannedDocument, XodrError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document =
        roxmltree::Document::parse_with_options(source, options).map_err(|err| {
            XodrError::XmlParse {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        })?;

    let root = document.root_element();
    let mut scanned = ScannedDocument::default();

    let geo_references: Vec<Node<'_, '_>> = child_elements(root, "header")
        .flat_map(|header| child_elements(header, "geoReference"))
        .collect();
    scanned.geo_reference_count = geo_references.len();
    if let [geo_reference] = geo_references.as_slice() {
        scanned.geo_reference = Some(geo_reference_slot(*geo_reference, source));
    }

    let mut stack = vec![(root, format!("/{}", root.tag_name().name()))];
    while let Some((node, path)) = stack.pop() {
        scanned.element_count += 1;

        // Markup inside the descriptor belongs to the descriptor.
        if geo_references.contains(&node) {
            continue;
        }

        let attributes: Vec<RawAttribute> = node
            .attributes()
            .filter(|attr| attr.namespace().is_none())
            .filter_map(|attr| {
                GEOMETRY_ATTRIBUTES
                    .iter()
                    .copied()
                    .find(|name| *name == attr.name())
                    .map(|name| RawAttribute {
                        name,
                        value: attr.value().to_string(),
                        range: attr.range_value(),
                    })
            })
            .collect();

        let mut sibling_index: HashMap<&str, usize> = HashMap::new();
        let children: Vec<_> = node
            .children()
            .filter(|child| child.is_element())
            .map(|child| {
                let name = child.tag_name().name();
                let index = sibling_index.entry(name).or_insert(0);
                *index += 1;
                (child, format!("{path}/{name}[{index}]"))
            })
            .collect();
        stack.extend(children.into_iter().rev());

        if !attributes.is_empty() {
            scanned.elements.push(ScannedElement { path, attributes });
        }
    }

    Ok(scanned)
}

/// Apply edits to `source`.
///
/// Edits may come in any order but must not overlap.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String, XodrError> {
    edits.sort_by_key(|edit| edit.range.start);

    let mut out = String::with_capacity(source.len() + edits.len() * 8);
    let mut cursor = 0;
    for edit in &edits {
        if edit.range.start < cursor || edit.range.end < edit.range.start {
            return Err(XodrError::OverlappingEdit {
                offset: edit.range.start,
            });
        }
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Fixed-precision rendering for rewritten numbers.
pub fn format_number(value: f64) -> String {
    // -0.0 prints with a sign
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value:.prec$}", prec = NUMBER_PRECISION)
}

/// Element content for a geoReference descriptor.
///
/// Written as CDATA unless the text itself contains the CDATA terminator.
pub fn geo_reference_content(text: &str) -> String {
    if text.contains("]]>") {
        xml_escape(text)
    } else {
        format!("<![CDATA[{text}]]>")
    }
}

/// Write `contents` to `path` through a temporary file in the same
/// directory, so `path` either keeps its old state or holds the full output.
///
/// With `overwrite == false` an existing `path` is left untouched and
/// [`XodrError::OutputExists`] is returned.
pub fn write_document(
    path: &Path,
    contents: &str,
    overwrite: bool,
    permissions: Option<fs::Permissions>,
) -> Result<(), XodrError> {
    let write_err = |source: std::io::Error| XodrError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = output_dir(path);
    let mut temp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    temp.write_all(contents.as_bytes()).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    if let Some(permissions) = permissions {
        temp.as_file().set_permissions(permissions).map_err(write_err)?;
    }

    let persisted = if overwrite {
        temp.persist(path)
    } else {
        temp.persist_noclobber(path)
    };

    persisted.map(|_| ()).map_err(|err| {
        if !overwrite && err.error.kind() == std::io::ErrorKind::AlreadyExists {
            XodrError::OutputExists {
                path: path.to_path_buf(),
            }
        } else {
            write_err(err.error)
        }
    })
}

fn output_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn geo_reference_slot(node: Node<'_, '_>, source: &str) -> GeoReferenceSlot {
    let text: String = node
        .children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect();

    let range = node.range();
    // The start tag ends at the first '>' after the last attribute value;
    // attribute values are the only place a literal '>' may appear.
    let search_from = node
        .attributes()
        .map(|attr| attr.range_value().end)
        .max()
        .unwrap_or(range.start);

    let open_end = source[search_from..range.end]
        .find('>')
        .map(|offset| search_from + offset + 1);
    let close_start = source[range.clone()]
        .rfind("</")
        .map(|offset| range.start + offset);

    let content = match (open_end, close_start) {
        (Some(start), Some(end)) if start <= end && start < range.end => Some(start..end),
        _ => None,
    };

    GeoReferenceSlot {
        text,
        content,
        has_child_elements: node.children().any(|child| child.is_element()),
    }
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == tag)
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
