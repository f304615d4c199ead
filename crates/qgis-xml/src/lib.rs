//! Forward-only element cursor over QGIS project XML.
//!
//! The cursor surfaces element events only (start and end), each tagged with
//! its nesting depth. Depths follow the `XMLReader` convention: the document
//! root is at depth 0, a start element and its matching end element share a
//! depth, and a self-closing element produces a single start event flagged as
//! empty with no end event.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("encoding: {0}")]
    Encoding(String),
}

/// Kind of element event the cursor is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Start,
    End,
}

/// One element event, owned so it outlives the reader's scratch buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    kind: NodeKind,
    local_name: String,
    depth: usize,
    is_empty: bool,
    attributes: Vec<(String, String)>,
}

impl XmlNode {
    /// Start element with children (an end event follows).
    pub fn start(local_name: impl Into<String>, depth: usize) -> Self {
        XmlNode {
            kind: NodeKind::Start,
            local_name: local_name.into(),
            depth,
            is_empty: false,
            attributes: Vec::new(),
        }
    }

    /// Self-closing start element (no end event follows).
    pub fn empty(local_name: impl Into<String>, depth: usize) -> Self {
        XmlNode {
            is_empty: true,
            ..XmlNode::start(local_name, depth)
        }
    }

    pub fn end(local_name: impl Into<String>, depth: usize) -> Self {
        XmlNode {
            kind: NodeKind::End,
            ..XmlNode::start(local_name, depth)
        }
    }

    /// Builder-style attribute append, mostly for replayed streams.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Element name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `true` for self-closing elements such as `<layer id="a"/>`.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Unescaped attribute value, returned verbatim (no trimming).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_start(&self, local_name: &str) -> bool {
        self.kind == NodeKind::Start && self.local_name == local_name
    }

    pub fn is_end(&self, local_name: &str) -> bool {
        self.kind == NodeKind::End && self.local_name == local_name
    }
}

/// Pull-based element stream with no look-ahead.
///
/// A cursor must not be advanced by more than one caller at a time; callers
/// hand it down as `&mut`.
pub trait XmlCursor {
    /// Advance to the next element event. `Ok(false)` once the stream is
    /// exhausted, after which [`XmlCursor::node`] returns `None`.
    fn read(&mut self) -> Result<bool, XmlError>;

    /// Event the cursor is positioned on. Never advances.
    fn node(&self) -> Option<&XmlNode>;
}

impl<C: XmlCursor + ?Sized> XmlCursor for &mut C {
    fn read(&mut self) -> Result<bool, XmlError> {
        (**self).read()
    }

    fn node(&self) -> Option<&XmlNode> {
        (**self).node()
    }
}

/// [`XmlCursor`] backed by a streaming `quick_xml::Reader`.
pub struct QuickXmlCursor<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    open: usize,
    current: Option<XmlNode>,
    finished: bool,
}

impl<'a> QuickXmlCursor<&'a [u8]> {
    pub fn from_xml(xml: &'a str) -> Self {
        QuickXmlCursor::new(Reader::from_str(xml))
    }
}

impl<R: BufRead> QuickXmlCursor<R> {
    pub fn from_reader(source: R) -> Self {
        QuickXmlCursor::new(Reader::from_reader(source))
    }

    fn new(mut reader: Reader<R>) -> Self {
        reader.trim_text(true);
        reader.expand_empty_elements(false);
        QuickXmlCursor {
            reader,
            buf: Vec::new(),
            open: 0,
            current: None,
            finished: false,
        }
    }

    /// Byte offset of the reader in the underlying source.
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }
}

impl<R: BufRead> XmlCursor for QuickXmlCursor<R> {
    fn read(&mut self) -> Result<bool, XmlError> {
        if self.finished {
            return Ok(false);
        }
        loop {
            self.buf.clear();
            let node = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => {
                    let node = start_node(&e, self.open, false)?;
                    self.open += 1;
                    node
                }
                Ok(Event::Empty(e)) => start_node(&e, self.open, true)?,
                Ok(Event::End(e)) => {
                    self.open = self.open.saturating_sub(1);
                    XmlNode::end(decode(e.local_name().as_ref())?, self.open)
                }
                Ok(Event::Eof) => {
                    if self.open > 0 {
                        trace!(open = self.open, "xml stream ended with open elements");
                    }
                    self.finished = true;
                    self.current = None;
                    return Ok(false);
                }
                Ok(_) => continue,
                Err(err) => {
                    return Err(XmlError::Xml(format!("at byte {}: {err}", self.position())))
                }
            };
            self.current = Some(node);
            return Ok(true);
        }
    }

    fn node(&self) -> Option<&XmlNode> {
        self.current.as_ref()
    }
}

fn start_node(event: &BytesStart<'_>, depth: usize, is_empty: bool) -> Result<XmlNode, XmlError> {
    let mut node = if is_empty {
        XmlNode::empty(decode(event.local_name().as_ref())?, depth)
    } else {
        XmlNode::start(decode(event.local_name().as_ref())?, depth)
    };
    for attr in event.attributes() {
        let attr = attr.map_err(|err| XmlError::Xml(err.to_string()))?;
        let key = decode(attr.key.local_name().as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::Xml(err.to_string()))?;
        node.attributes.push((key, value.into_owned()));
    }
    Ok(node)
}

fn decode(bytes: &[u8]) -> Result<String, XmlError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|err| XmlError::Encoding(err.to_string()))
}

/// [`XmlCursor`] replaying a pre-recorded event list.
#[derive(Debug)]
pub struct ReplayCursor {
    nodes: std::vec::IntoIter<XmlNode>,
    current: Option<XmlNode>,
}

impl ReplayCursor {
    pub fn new(nodes: Vec<XmlNode>) -> Self {
        ReplayCursor {
            nodes: nodes.into_iter(),
            current: None,
        }
    }
}

impl XmlCursor for ReplayCursor {
    fn read(&mut self) -> Result<bool, XmlError> {
        self.current = self.nodes.next();
        Ok(self.current.is_some())
    }

    fn node(&self) -> Option<&XmlNode> {
        self.current.as_ref()
    }
}

/// Advance until the cursor sits on a start element named `local_name`.
///
/// Returns `Ok(false)` when the stream ends first.
pub fn advance_to_start<C: XmlCursor + ?Sized>(
    cursor: &mut C,
    local_name: &str,
) -> Result<bool, XmlError> {
    while cursor.read()? {
        if cursor.node().is_some_and(|node| node.is_start(local_name)) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Step over the subtree of the start element the cursor is positioned on,
/// leaving the cursor on its matching end element.
///
/// Self-closing elements (and cursors not on a start element) are left as is.
/// Returns `Ok(false)` when the stream ends before the end element.
pub fn skip_subtree<C: XmlCursor + ?Sized>(cursor: &mut C) -> Result<bool, XmlError> {
    let (name, depth) = match cursor.node() {
        Some(node) if node.kind() == NodeKind::Start && !node.is_empty() => {
            (node.local_name().to_owned(), node.depth())
        }
        _ => return Ok(true),
    };
    skip_to_end(cursor, &name, depth)
}

/// Advance until the end element `local_name` at `depth`, wherever inside
/// that element's subtree the cursor currently is.
///
/// Returns `Ok(true)` without reading when the cursor already sits on it,
/// `Ok(false)` when the stream ends first.
pub fn skip_to_end<C: XmlCursor + ?Sized>(
    cursor: &mut C,
    local_name: &str,
    depth: usize,
) -> Result<bool, XmlError> {
    let is_target =
        |node: Option<&XmlNode>| node.is_some_and(|n| n.depth() == depth && n.is_end(local_name));
    if is_target(cursor.node()) {
        return Ok(true);
    }
    while cursor.read()? {
        if is_target(cursor.node()) {
            return Ok(true);
        }
    }
    Ok(false)
}
