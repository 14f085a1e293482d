use alloc::string::{String, ToString};
use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use vc_serializer::SerializationError;
use vc_serializer::native::{Metadata, Native, Node};

use super::{ITEM, NAME, ROOT};
use crate::format::render_error;

/// The text of an attribute value; `None` leaves the attribute out.
fn attribute_text(node: &Node) -> Option<String> {
    match node.as_scalar() {
        Some(scalar) if !scalar.is_null() => Some(scalar.to_string()),
        _ => None,
    }
}

/// Streams native nodes as XML elements.
///
/// Entries of a mapping named in the `attributes` hint become attributes of
/// the mapping's element. On a sequence or a scalar the same hint picks
/// attribute values from the node's sub-fields. Sequence items are named by
/// the `item_name` hint, `object` by default.
pub(super) struct XmlWriter<W: io::Write> {
    inner: Writer<W>,
}

impl<W: io::Write> XmlWriter<W> {
    pub(super) fn new(out: W, indent: bool) -> Self {
        let inner = if indent {
            Writer::new_with_indent(out, b' ', 4)
        } else {
            Writer::new(out)
        };
        Self { inner }
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), SerializationError> {
        self.inner.write_event(event).map_err(|e| render_error(NAME, e))
    }

    pub(super) fn start_document(&mut self) -> Result<(), SerializationError> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        let root = BytesStart::new(ROOT).with_attributes([("version", "1.0")]);
        self.write(Event::Start(root))
    }

    pub(super) fn end_document(&mut self) -> Result<(), SerializationError> {
        self.write(Event::End(BytesEnd::new(ROOT)))?;
        let out = self.inner.get_mut();
        out.write_all(b"\n")
            .and_then(|()| out.flush())
            .map_err(|e| render_error(NAME, e))
    }

    pub(super) fn write_node(&mut self, node: &Node, name: &str) -> Result<(), SerializationError> {
        let metadata = node.metadata();
        let attributes = metadata.map(Metadata::attributes).unwrap_or_default();
        let mut start = BytesStart::new(name);

        match &node.value {
            Native::Mapping(map) => {
                for key in attributes {
                    if let Some(text) = map.get(key.as_str()).and_then(attribute_text) {
                        start.push_attribute((key.as_str(), text.as_str()));
                    }
                }
                let mut children = map.iter().filter(|(key, _)| !attributes.contains(*key)).peekable();
                if children.peek().is_none() {
                    return self.write(Event::Empty(start));
                }
                self.write(Event::Start(start))?;
                for (key, child) in children {
                    self.write_node(child, key)?;
                }
            }
            value => {
                if let Some(fields) = metadata.and_then(Metadata::fields) {
                    for key in attributes {
                        if let Some(text) = fields.get(key.as_str()).and_then(attribute_text) {
                            start.push_attribute((key.as_str(), text.as_str()));
                        }
                    }
                }
                match value {
                    Native::Sequence(items) if !items.is_empty() => {
                        let item = metadata.and_then(Metadata::item_name).unwrap_or(ITEM);
                        self.write(Event::Start(start))?;
                        for child in items {
                            self.write_node(child, item)?;
                        }
                    }
                    Native::Scalar(scalar) if !scalar.is_null() => {
                        self.write(Event::Start(start))?;
                        let text = scalar.to_string();
                        self.write(Event::Text(BytesText::new(&text)))?;
                    }
                    _ => return self.write(Event::Empty(start)),
                }
            }
        }
        self.write(Event::End(BytesEnd::new(name)))
    }
}
