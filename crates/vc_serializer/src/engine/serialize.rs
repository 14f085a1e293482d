use alloc::string::ToString;
use alloc::vec::Vec;

use log::trace;

use super::{Context, ObjectSerializer};
use crate::error::SerializationError;
use crate::field::{DescriptorKind, FieldDescriptor};
use crate::model::{Object, Value};
use crate::native::{Metadata, Native, NativeMap, Node};
use crate::resolve;
use crate::schema::Schema;

// -----------------------------------------------------------------------------
// Serialize

impl ObjectSerializer {
    /// Serializes one object into a mapping node.
    #[inline]
    pub fn serialize(&self, cx: &Context<'_>, object: &dyn Object) -> Result<Node, SerializationError> {
        self.serialize_value(cx, Value::Object(object))
    }

    /// Serializes an already classified value.
    ///
    /// Scalars come back unchanged. Mappings and sequences are serialized
    /// element-wise; objects field-wise through the resolved schema.
    pub fn serialize_value(&self, cx: &Context<'_>, value: Value<'_>) -> Result<Node, SerializationError> {
        match value {
            Value::Scalar(scalar) => Ok(Node::new(scalar)),
            Value::Mapping(entries) => {
                let mut map = NativeMap::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key, self.serialize_value(cx, value)?);
                }
                Ok(Node::new(map))
            }
            Value::Sequence(items) => {
                let nodes = items
                    .map(|item| self.serialize_value(cx, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::with_metadata(nodes, self.metadata.clone()))
            }
            Value::Object(object) => self.serialize_object(cx, object),
        }
    }

    /// Lazily serializes `objects`, one per call to `next`.
    ///
    /// The stream is single-pass: items are produced as the source iterator
    /// is advanced and cannot be replayed.
    #[inline]
    pub fn serialize_iter<'s, 'c, 'o, I>(
        &'s self,
        cx: &Context<'c>,
        objects: I,
    ) -> SerializeIter<'s, 'c, I::IntoIter>
    where
        I: IntoIterator<Item = &'o dyn Object>,
    {
        SerializeIter {
            serializer: self,
            cx: *cx,
            objects: objects.into_iter(),
        }
    }

    fn serialize_object(&self, cx: &Context<'_>, object: &dyn Object) -> Result<Node, SerializationError> {
        let cx = self.scoped(cx);
        let fields = resolve::fields_for_object(&self.schema, &self.config, object)?;
        let mut metadata = self.metadata.clone();
        let mut map = NativeMap::with_capacity(fields.len());
        for (name, descriptor) in fields.iter() {
            trace!("{}: serializing `{name}` of `{}`", self.name, object.type_name());
            let node = serialize_descriptor(&cx, descriptor, object, name)?;
            let key = descriptor.output_key(name);
            if descriptor.options().attribute {
                metadata.add_attribute(key);
            }
            map.insert(key.to_string(), node);
        }
        Ok(Node::with_metadata(map, metadata))
    }
}

/// Runs one descriptor against `source`.
///
/// `name` is the attribute to read: the schema name for top-level fields, the
/// parent's name for sub-fields.
fn serialize_descriptor(
    cx: &Context<'_>,
    descriptor: &FieldDescriptor,
    source: &dyn Object,
    name: &str,
) -> Result<Node, SerializationError> {
    let follow = descriptor.options().follow_object;
    match descriptor.kind() {
        DescriptorKind::Field { field, fields } => {
            let lookup = follow.then_some(name);
            if lookup.is_none() && !fields.is_empty() {
                return Err(SerializationError::UnresolvedFlatten {
                    field: name.to_string(),
                });
            }
            let native = match field.get_object(cx, source, lookup)? {
                Value::Sequence(items) => Native::Sequence(
                    items
                        .map(|item| field.serialize_item(cx, item))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                value => field.serialize_object(cx, value)?,
            };
            let mut metadata = Metadata::new();
            field.metadata(&mut metadata);
            if let Some(lookup) = lookup
                && !fields.is_empty()
            {
                for (sub, descriptor) in fields.iter() {
                    if descriptor.options().attribute {
                        metadata.add_attribute(descriptor.output_key(sub));
                    }
                }
                metadata.set_fields(serialize_fields(cx, fields, source, lookup)?);
            }
            Ok(Node::with_metadata(native, metadata))
        }
        DescriptorKind::Serializer(nested) => {
            let value = if follow {
                source
                    .get(name)
                    .ok_or_else(|| SerializationError::MissingAttribute {
                        object: source.type_name().to_string(),
                        field: name.to_string(),
                    })?
            } else {
                Value::Object(source)
            };
            nested.serialize_value(cx, value)
        }
    }
}

/// Serializes sub-fields against the parent's source and name.
fn serialize_fields(
    cx: &Context<'_>,
    schema: &Schema,
    source: &dyn Object,
    name: &str,
) -> Result<NativeMap, SerializationError> {
    let mut map = NativeMap::with_capacity(schema.len());
    for (sub, descriptor) in schema.iter() {
        let node = serialize_descriptor(cx, descriptor, source, name)?;
        map.insert(descriptor.output_key(sub).to_string(), node);
    }
    Ok(map)
}

// -----------------------------------------------------------------------------
// SerializeIter

/// A lazy, single-pass stream of serialized objects.
///
/// See [`ObjectSerializer::serialize_iter`].
pub struct SerializeIter<'s, 'c, I> {
    serializer: &'s ObjectSerializer,
    cx: Context<'c>,
    objects: I,
}

impl<'o, I> Iterator for SerializeIter<'_, '_, I>
where
    I: Iterator<Item = &'o dyn Object>,
{
    type Item = Result<Node, SerializationError>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let object = self.objects.next()?;
        Some(self.serializer.serialize(&self.cx, object))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.objects.size_hint()
    }
}
