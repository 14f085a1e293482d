use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::str;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use vc_serializer::DeserializationError;
use vc_serializer::native::{Native, NativeMap, Node};
use vc_utils::OrderedMap;

use super::{ITEM, NAME, NATURAL};
use crate::format::parse_error;

fn fail(reason: impl core::fmt::Display) -> DeserializationError {
    parse_error(NAME, reason)
}

/// An element whose end tag has not been read yet.
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: OrderedMap<String, Vec<Native>>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, DeserializationError> {
        let tag = str::from_utf8(start.name().as_ref()).map_err(fail)?.to_string();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(fail)?;
            let key = str::from_utf8(attribute.key.as_ref()).map_err(fail)?.to_string();
            let value = attribute.unescape_value().map_err(fail)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            tag,
            attributes,
            children: OrderedMap::new(),
            text: String::new(),
        })
    }

    fn push_child(&mut self, tag: String, value: Native) {
        match self.children.get_mut(tag.as_str()) {
            Some(values) => values.push(value),
            None => {
                self.children.insert(tag, Vec::from([value]));
            }
        }
    }

    /// Folds the element into a native value.
    ///
    /// - Repeated children of one tag, or any `object`/`natural` children,
    ///   form a sequence.
    /// - Other children form a mapping, after the attributes. A tag that
    ///   repeats among different tags maps to a sequence.
    /// - Text alone is a string, kept exactly as written; an empty element
    ///   is `Null`. Text beside child elements is layout and is dropped.
    ///   Attributes are kept only on mappings.
    fn close(self) -> (String, Native) {
        let Self {
            tag,
            attributes,
            children,
            text,
        } = self;

        if children.is_empty() {
            let value = if text.is_empty() {
                Native::NULL
            } else {
                Native::from(text)
            };
            return (tag, value);
        }

        let is_sequence = children.len() == 1
            && children
                .get_index(0)
                .is_some_and(|(child, values)| values.len() > 1 || child == ITEM || child == NATURAL);
        if is_sequence {
            let items = children.into_iter().flat_map(|(_, values)| values);
            return (tag, Native::Sequence(items.map(Node::from).collect()));
        }

        let mut map = NativeMap::with_capacity(attributes.len() + children.len());
        for (key, value) in attributes {
            map.insert(key, Node::from(Native::from(value)));
        }
        for (child, mut values) in children {
            let value = match values.len() {
                1 => values.pop().unwrap_or(Native::NULL),
                _ => Native::Sequence(values.into_iter().map(Node::from).collect()),
            };
            map.insert(child, Node::from(value));
        }
        (tag, Native::Mapping(map))
    }
}

/// Reads the children of the root element as a sequence of objects.
pub(super) fn parse(input: &[u8]) -> Result<Native, DeserializationError> {
    let mut reader = Reader::from_reader(input);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut objects: Vec<Node> = Vec::new();
    let mut root_closed = false;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(fail)?;
        let (opened, closes) = match &event {
            Event::Start(start) => (Some(Element::open(start)?), false),
            Event::Empty(start) => (Some(Element::open(start)?), true),
            Event::End(_) => (None, true),
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text.unescape().map_err(fail)?);
                }
                (None, false)
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(str::from_utf8(data).map_err(fail)?);
                }
                (None, false)
            }
            Event::Eof => break,
            _ => (None, false),
        };

        if let Some(element) = opened {
            if root_closed {
                return Err(fail("content after the root element"));
            }
            stack.push(element);
        }
        if closes && let Some(element) = stack.pop() {
            let (tag, value) = element.close();
            match stack.len() {
                0 => root_closed = true,
                1 => objects.push(Node::from(value)),
                _ => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_child(tag, value);
                    }
                }
            }
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(fail("unexpected end of input"));
    }
    if !root_closed {
        return Err(fail("no root element"));
    }
    Ok(Native::Sequence(objects))
}

#[cfg(test)]
mod tests {
    use super::parse;
    use alloc::string::String;
    use alloc::vec::Vec;
    use vc_serializer::DeserializationError;
    use vc_serializer::native::Native;

    fn objects(input: &str) -> Native {
        parse(input.as_bytes()).unwrap()
    }

    #[test]
    fn object_attributes_come_first() {
        let tree = objects(
            r#"<objects version="1.0">
                <object pk="7" model="blog.article">
                    <fields><headline type="CharField">Hi</headline></fields>
                </object>
            </objects>"#,
        );
        let items = tree.as_sequence().unwrap();
        assert_eq!(items.len(), 1);

        let object = items[0].as_mapping().unwrap();
        let keys: Vec<_> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, ["pk", "model", "fields"]);
        assert_eq!(object.get("pk").unwrap().as_str(), Some("7"));

        let fields = object.get("fields").unwrap().as_mapping().unwrap();
        assert_eq!(fields.get("headline").unwrap().as_str(), Some("Hi"));
    }

    #[test]
    fn items_form_sequences() {
        let tree = objects(
            "<objects><object><fields>\
                <tags rel=\"ManyToManyRel\"><object>1</object></tags>\
                <author><natural>alice</natural></author>\
                <empty/>\
            </fields></object></objects>",
        );
        let object = &tree.as_sequence().unwrap()[0];
        let fields = object.as_mapping().unwrap().get("fields").unwrap();
        let fields = fields.as_mapping().unwrap();

        let tags = fields.get("tags").unwrap().as_sequence().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].as_str(), Some("1"));

        let author = fields.get("author").unwrap().as_sequence().unwrap();
        assert_eq!(author[0].as_str(), Some("alice"));

        assert!(fields.get("empty").unwrap().is_null());
    }

    #[test]
    fn escaped_text_is_unescaped() {
        let tree = objects("<objects><object><fields><a>x &amp; y</a></fields></object></objects>");
        let object = tree.as_sequence().unwrap()[0].as_mapping().unwrap();
        let fields = object.get("fields").unwrap().as_mapping().unwrap();
        assert_eq!(fields.get("a").unwrap().as_str(), Some("x & y"));
    }

    #[test]
    fn malformed_input_is_a_format_error() {
        for input in ["", "<objects><object>", "<objects></object>"] {
            let err = parse(input.as_bytes()).unwrap_err();
            assert!(matches!(err, DeserializationError::Format { .. }), "{input}");
        }
    }

    #[test]
    fn leaf_text_keeps_its_whitespace() {
        let tree = objects(
            "<objects>\n  <object>\n    <fields>\n      \
                <padded>  Hi  </padded>\n      \
                <blank>   </blank>\n    \
            </fields>\n  </object>\n</objects>\n",
        );
        let object = tree.as_sequence().unwrap()[0].as_mapping().unwrap();
        let keys: Vec<_> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, ["fields"]);

        let fields = object.get("fields").unwrap().as_mapping().unwrap();
        assert_eq!(fields.get("padded").unwrap().as_str(), Some("  Hi  "));
        assert_eq!(fields.get("blank").unwrap().as_str(), Some("   "));
    }
}
