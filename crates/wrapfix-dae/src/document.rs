//! COLLADA document tree and the element helpers the stages share.

use std::io::Write;
use std::path::Path;

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{DaeError, DaeResult};

/// A parsed COLLADA document.
#[derive(Debug, Clone, PartialEq)]
pub struct DaeDocument {
    root: Element,
}

impl DaeDocument {
    /// Parses a document from bytes.
    pub fn parse(bytes: &[u8]) -> DaeResult<Self> {
        let root = Element::parse(bytes)?;
        if root.name != "COLLADA" {
            return Err(DaeError::NotCollada(root.name));
        }
        Ok(Self { root })
    }

    /// Reads and parses a document from disk.
    pub fn read(path: &Path) -> DaeResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Root `<COLLADA>` element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Schema version from the root element (e.g. "1.4.1").
    pub fn version(&self) -> &str {
        attr(&self.root, "version").unwrap_or("1.4.1")
    }

    /// Returns true for 1.5 documents, which wrap `init_from` paths in `<ref>`.
    pub fn uses_init_from_ref(&self) -> bool {
        self.version().starts_with("1.5")
    }

    /// Entries of every `<library_*>` element named `library`, in document order.
    pub fn library<'a>(&'a self, library: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        children_named(&self.root, library).flat_map(child_elements)
    }

    /// Serializes the document with indentation.
    pub fn to_bytes(&self) -> DaeResult<Vec<u8>> {
        let mut out = Vec::new();
        let config = EmitterConfig::new().perform_indent(true);
        self.root.write_with_config(&mut out, config)?;
        Ok(out)
    }

    /// Writes the document through a sibling temp file renamed into place.
    pub fn write_atomic(&self, path: &Path) -> DaeResult<()> {
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::Builder::new()
            .prefix(".wrapfix_")
            .suffix(".dae.tmp")
            .tempfile_in(dir)?;
        file.write_all(&bytes)?;
        file.flush()?;
        file.persist(path).map_err(|e| DaeError::Io(e.error))?;
        Ok(())
    }
}

// =============================================================================
// Element helpers
// =============================================================================

/// Element children, skipping text and comments.
pub(crate) fn child_elements(el: &Element) -> impl Iterator<Item = &Element> {
    el.children.iter().filter_map(XMLNode::as_element)
}

/// Element children with the given local name.
pub(crate) fn children_named<'a>(
    el: &'a Element,
    name: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    child_elements(el).filter(move |c| c.name == name)
}

/// Descendants (excluding `el`) with the given local name, in document order.
pub(crate) fn descendants_named<'a>(el: &'a Element, name: &str) -> Vec<&'a Element> {
    let mut found = Vec::new();
    collect_descendants(el, name, &mut found);
    found
}

fn collect_descendants<'a>(el: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in child_elements(el) {
        if child.name == name {
            found.push(child);
        }
        collect_descendants(child, name, found);
    }
}

pub(crate) fn attr<'a>(el: &'a Element, name: &str) -> Option<&'a str> {
    el.attributes.get(name).map(String::as_str)
}

/// Trimmed text content, empty when there is none.
pub(crate) fn text(el: &Element) -> String {
    el.get_text()
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Strips the leading `#` of a URL fragment reference.
pub(crate) fn fragment(url: &str) -> &str {
    let url = url.trim();
    url.strip_prefix('#').unwrap_or(url)
}

/// Path of an `<image>` element: `init_from` text or `init_from/ref`.
pub(crate) fn image_path(image: &Element) -> String {
    match image.get_child("init_from") {
        Some(init) => match init.get_child("ref") {
            Some(reference) => text(reference),
            None => text(init),
        },
        None => String::new(),
    }
}

pub(crate) fn parse_floats(raw: &str, context: &str) -> DaeResult<Vec<f64>> {
    raw.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| DaeError::invalid(context, format!("'{}' is not a number", token)))
        })
        .collect()
}

pub(crate) fn parse_indices(raw: &str, context: &str) -> DaeResult<Vec<usize>> {
    raw.split_whitespace()
        .map(|token| {
            token
                .parse::<usize>()
                .map_err(|_| DaeError::invalid(context, format!("'{}' is not an index", token)))
        })
        .collect()
}

/// Parses an optional unsigned attribute, falling back to `default`.
pub(crate) fn attr_usize(el: &Element, name: &str, default: usize) -> DaeResult<usize> {
    match attr(el, name) {
        Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
            DaeError::invalid(
                format!("<{}> attribute '{}'", el.name, name),
                format!("'{}' is not an unsigned integer", raw),
            )
        }),
        None => Ok(default),
    }
}

pub(crate) fn format_floats(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    parts.join(" ")
}

/// Replaces all text content of `el`.
pub(crate) fn set_text(el: &mut Element, value: impl Into<String>) {
    el.children
        .retain(|c| !matches!(c, XMLNode::Text(_) | XMLNode::CData(_)));
    el.children.push(XMLNode::Text(value.into()));
}

/// Creates an element with text content.
pub(crate) fn text_element(name: &str, value: impl Into<String>) -> Element {
    let mut el = Element::new(name);
    el.children.push(XMLNode::Text(value.into()));
    el
}

/// First element in the subtree (including `el`) matching `pred`.
pub(crate) fn find_mut<'a>(
    el: &'a mut Element,
    pred: &dyn Fn(&Element) -> bool,
) -> Option<&'a mut Element> {
    if pred(el) {
        return Some(el);
    }
    for child in el.children.iter_mut() {
        if let XMLNode::Element(child) = child {
            if let Some(found) = find_mut(child, pred) {
                return Some(found);
            }
        }
    }
    None
}

/// Calls `f` on every element of the subtree, parents before children.
pub(crate) fn visit_mut(el: &mut Element, f: &mut dyn FnMut(&mut Element)) {
    f(el);
    for child in el.children.iter_mut() {
        if let XMLNode::Element(child) = child {
            visit_mut(child, f);
        }
    }
}

/// Sets the text of the child named `name`, inserting the child if missing.
///
/// A new child goes right after the last sibling named in `after`, or first
/// when none of them exist, so schema ordering holds.
pub(crate) fn set_child_text(el: &mut Element, name: &str, after: &[&str], value: &str) {
    if let Some(child) = el.get_mut_child(name) {
        set_text(child, value);
        return;
    }
    let insert_at = el
        .children
        .iter()
        .rposition(|c| c.as_element().is_some_and(|e| after.contains(&e.name.as_str())))
        .map(|i| i + 1)
        .unwrap_or(0);
    el.children
        .insert(insert_at, XMLNode::Element(text_element(name, value)));
}
