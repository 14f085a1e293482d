//! XML: `<objects version="1.0">` holding one `<object>` element per object.
//!
//! ```text
//! <objects version="1.0">
//!     <object pk="7" model="blog.article">
//!         <fields>
//!             <headline type="CharField">Hi</headline>
//!             <author rel="ManyToOneRel" to="auth.user">3</author>
//!             <tags rel="ManyToManyRel" to="blog.tag">
//!                 <object>1</object>
//!             </tags>
//!         </fields>
//!     </object>
//! </objects>
//! ```
//!
//! Values are written as text and read back as strings, which the model
//! fields convert to their own types. Empty elements read back as `Null`.

mod fields;
mod parse;
mod render;

pub use fields::{RelField, TextField, ToField, TypeField};

use std::io;

use vc_serializer::field::{FieldDescriptor, M2mField, ModelField, RelatedField};
use vc_serializer::native::Native;
use vc_serializer::schema::Schema;
use vc_serializer::{
    ConfigPatch, DeserializationError, ObjectSerializer, SerializationError, SerializerError,
};

use crate::dump;
use crate::format::{Format, NodeStream};
use render::XmlWriter;

const NAME: &str = "xml";
const ROOT: &str = "objects";
const ITEM: &str = "object";
const NATURAL: &str = "natural";

/// The dump layout with `pk` and `model` as attributes, and the field type
/// or relation described on every field element.
pub fn serializer() -> Result<ObjectSerializer, SerializerError> {
    let typed = Schema::builder("TypedField")
        .field("type", FieldDescriptor::field(TypeField).attribute(true))
        .build()?;
    let related = Schema::builder("RelationField")
        .field("rel", FieldDescriptor::field(RelField).attribute(true))
        .field("to", FieldDescriptor::field(ToField).attribute(true))
        .build()?;
    let m2m = related.clone();

    let fields = ObjectSerializer::builder("XmlFieldsSerializer")
        .meta(
            ConfigPatch::new()
                .field_serializer(move || {
                    FieldDescriptor::field(TextField(ModelField)).with_fields(typed.clone())
                })
                .related_serializer(move || {
                    FieldDescriptor::field(TextField(RelatedField)).with_fields(related.clone())
                })
                .m2m_serializer(move || FieldDescriptor::field(M2mField::new()).with_fields(m2m.clone())),
        )
        .build()?;

    dump::builder(fields).attributes(["pk", dump::CLASS_KEY]).build()
}

/// Renders objects as XML elements, see the [module docs](self).
#[derive(Debug, Clone, Copy)]
pub struct XmlFormat {
    indent: bool,
}

impl Default for XmlFormat {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl XmlFormat {
    /// Indented output.
    #[inline]
    pub fn new() -> Self {
        Self { indent: true }
    }

    /// Everything on one line.
    #[inline]
    pub fn compact() -> Self {
        Self { indent: false }
    }
}

impl Format for XmlFormat {
    #[inline]
    fn name(&self) -> &str {
        NAME
    }

    fn serializer(&self, options: &ConfigPatch) -> Result<ObjectSerializer, SerializerError> {
        serializer()?.configure_field(dump::FIELDS, options)
    }

    fn render(
        &self,
        nodes: &mut NodeStream<'_>,
        out: &mut dyn io::Write,
    ) -> Result<(), SerializationError> {
        let mut writer = XmlWriter::new(out, self.indent);
        writer.start_document()?;
        for node in nodes {
            writer.write_node(&node?, ITEM)?;
        }
        writer.end_document()
    }

    #[inline]
    fn parse(&self, input: &[u8]) -> Result<Native, DeserializationError> {
        parse::parse(input)
    }
}
