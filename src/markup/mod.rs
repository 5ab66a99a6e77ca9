/*!
 * Markup tree for HTML/XHTML fragments.
 *
 * The tree is built from `quick-xml` events in a permissive mode (no end-name
 * checks, HTML void elements, raw-text `script`/`style` bodies) and every node
 * keeps the exact source text it was parsed from. Serializing an unmodified
 * tree therefore reproduces the input byte for byte, which is what lets
 * protected subtrees be restored verbatim.
 */

use std::collections::BTreeMap;
use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::errors::PipelineError;

pub mod protector;

pub use protector::{IgnoreTags, PlaceholderMap, Protector, RestoreReport};

/// HTML elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose body is opaque text up to the matching closing tag
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A single node of the markup tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Element with its children
    Element(Element),
    /// Character data, kept escaped exactly as in the source
    Text(String),
    /// Comments, doctype, processing instructions, CDATA and stray end tags
    Other(String),
}

/// Element node
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name as written, including any namespace prefix
    pub name: String,
    /// Attributes in lenient HTML form; values are left unescaped
    pub attributes: BTreeMap<String, String>,
    /// Verbatim opening tag (`<p class="x">`, `<br/>`)
    pub start_tag: String,
    /// Child nodes in document order
    pub children: Vec<Node>,
    /// Verbatim closing tag, `None` for void, self-closing or unclosed elements
    pub end_tag: Option<String>,
}

impl Element {
    fn open(event: &BytesStart<'_>, raw: &str) -> Self {
        let attributes = event
            .html_attributes()
            .flatten()
            .map(|attr| {
                (
                    String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                    String::from_utf8_lossy(&attr.value).into_owned(),
                )
            })
            .collect();

        Self {
            name: String::from_utf8_lossy(event.name().as_ref()).into_owned(),
            attributes,
            start_tag: raw.to_string(),
            children: Vec::new(),
            end_tag: None,
        }
    }

    /// Tag name lowercased for case-insensitive matching
    pub fn local_key(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Look up an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Serialize this element and its subtree
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.start_tag);
        for child in &self.children {
            child.write_to(out);
        }
        if let Some(end_tag) = &self.end_tag {
            out.push_str(end_tag);
        }
    }
}

impl Node {
    fn write_to(&self, out: &mut String) {
        match self {
            Node::Element(element) => element.write_to(out),
            Node::Text(text) | Node::Other(text) => out.push_str(text),
        }
    }
}

/// Ordered forest of top-level nodes parsed from one markup string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupTree {
    /// Top-level nodes in document order
    pub nodes: Vec<Node>,
}

impl MarkupTree {
    /// Parse a markup string into a tree.
    ///
    /// Mismatched or stray closing tags are tolerated; only inputs the event
    /// reader itself rejects (for example an unterminated `<` at the end of the
    /// document) produce a `PipelineError::Parse`.
    pub fn parse(source: &str) -> Result<Self, PipelineError> {
        let mut builder = TreeBuilder::default();
        let mut base = 0;

        // The reader drops a leading BOM silently, which would shift every span
        if source.starts_with('\u{feff}') {
            builder.push(Node::Other('\u{feff}'.to_string()));
            base = '\u{feff}'.len_utf8();
        }

        'segments: loop {
            let mut reader = Reader::from_str(&source[base..]);
            reader.check_end_names(false);
            let mut cursor = base;

            loop {
                let event = reader.read_event().map_err(|e| PipelineError::Parse {
                    position: base + reader.buffer_position(),
                    message: e.to_string(),
                })?;

                // Text events are measured by their own length; every other
                // event ends where the reader stopped.
                let end = match &event {
                    Event::Text(text) => cursor + text.len(),
                    Event::Eof => break 'segments,
                    _ => base + reader.buffer_position(),
                };
                let raw = &source[cursor..end];
                cursor = end;

                match event {
                    Event::Start(start) => {
                        let element = Element::open(&start, raw);
                        let key = element.local_key();
                        if VOID_ELEMENTS.contains(&key.as_str()) {
                            builder.push(Node::Element(element));
                        } else if RAW_TEXT_ELEMENTS.contains(&key.as_str()) {
                            base = builder.raw_text(source, cursor, element, &key);
                            if base >= source.len() {
                                break 'segments;
                            }
                            continue 'segments;
                        } else {
                            builder.open(element);
                        }
                    }
                    Event::Empty(start) => {
                        builder.push(Node::Element(Element::open(&start, raw)));
                    }
                    Event::End(end_tag) => {
                        let name = String::from_utf8_lossy(end_tag.name().as_ref()).into_owned();
                        builder.close(&name, raw);
                    }
                    Event::Text(_) => builder.push(Node::Text(raw.to_string())),
                    _ => builder.push(Node::Other(raw.to_string())),
                }
            }
        }

        Ok(builder.finish())
    }

    /// Serialize the tree back into markup
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_to(&mut out);
        }
        out
    }
}

impl fmt::Display for MarkupTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

/// Stack-based tree assembly
#[derive(Default)]
struct TreeBuilder {
    roots: Vec<Node>,
    open: Vec<Element>,
}

impl TreeBuilder {
    fn push(&mut self, node: Node) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn open(&mut self, element: Element) {
        self.open.push(element);
    }

    fn close(&mut self, name: &str, raw: &str) {
        let matching = self
            .open
            .iter()
            .rposition(|element| element.name.eq_ignore_ascii_case(name));

        let Some(index) = matching else {
            self.push(Node::Other(raw.to_string()));
            return;
        };

        // Anything opened after the match is implicitly closed
        while self.open.len() > index + 1 {
            self.pop_into_parent();
        }
        if let Some(mut element) = self.open.pop() {
            element.end_tag = Some(raw.to_string());
            self.push(Node::Element(element));
        }
    }

    fn pop_into_parent(&mut self) {
        if let Some(element) = self.open.pop() {
            self.push(Node::Element(element));
        }
    }

    /// Consume a raw-text body and its closing tag, returning the offset to resume at
    fn raw_text(&mut self, source: &str, body_start: usize, mut element: Element, key: &str) -> usize {
        let (body_end, resume) = match find_closing_tag(source, body_start, key) {
            Some((close_start, close_end)) => {
                element.end_tag = Some(source[close_start..close_end].to_string());
                (close_start, close_end)
            }
            None => (source.len(), source.len()),
        };

        if body_end > body_start {
            element
                .children
                .push(Node::Text(source[body_start..body_end].to_string()));
        }
        self.push(Node::Element(element));
        resume
    }

    fn finish(mut self) -> MarkupTree {
        while !self.open.is_empty() {
            self.pop_into_parent();
        }
        MarkupTree { nodes: self.roots }
    }
}

/// Find `</name ...>` case-insensitively at or after `from`
fn find_closing_tag(source: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let bytes = source.as_bytes();
    let mut search = from;

    while let Some(found) = source[search..].find("</") {
        let start = search + found;
        let name_start = start + 2;
        let name_end = name_start + name.len();

        let name_matches = bytes
            .get(name_start..name_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
        let terminated = bytes
            .get(name_end)
            .is_some_and(|b| *b == b'>' || *b == b'/' || b.is_ascii_whitespace());

        if name_matches && terminated {
            let close = source[name_end..].find('>')?;
            return Some((start, name_end + close + 1));
        }
        search = name_start;
    }

    None
}
