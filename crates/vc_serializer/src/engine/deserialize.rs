use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;

use log::{debug, trace, warn};

use super::{Context, ObjectSerializer};
use crate::config::ClassName;
use crate::container::DeserializedObject;
use crate::error::{DeserializationError, SerializationError};
use crate::field::{DescriptorKind, Field, FieldTarget};
use crate::model::{Restored, Value};
use crate::native::{Metadata, Native, NativeMap, Node};
use crate::resolve;

fn unexpected(expected: &'static str, found: &Native) -> DeserializationError {
    DeserializationError::UnexpectedShape {
        expected,
        found: found.kind_name(),
    }
}

// -----------------------------------------------------------------------------
// Deserialize

impl ObjectSerializer {
    /// Rebuilds one object from a mapping into a fresh container.
    pub fn deserialize(
        &self,
        cx: &Context<'_>,
        node: &Native,
    ) -> Result<DeserializedObject, DeserializationError> {
        let map = node.as_mapping().ok_or_else(|| unexpected("a mapping", node))?;
        let mut instance = self.create_instance(cx, map)?;
        self.deserialize_object(cx, map, &mut instance)?;
        Ok(instance)
    }

    /// Rebuilds every object of a sequence, or the single object of a
    /// mapping.
    pub fn deserialize_many(
        &self,
        cx: &Context<'_>,
        node: &Native,
    ) -> Result<Vec<DeserializedObject>, DeserializationError> {
        match node {
            Native::Sequence(items) => items.iter().map(|item| self.deserialize(cx, item)).collect(),
            Native::Mapping(_) => Ok(Vec::from([self.deserialize(cx, node)?])),
            Native::Scalar(_) => Err(unexpected("a sequence or mapping", node)),
        }
    }

    /// Fills an existing container from a mapping.
    ///
    /// `Null` stands for a mapping without entries.
    pub fn deserialize_into(
        &self,
        cx: &Context<'_>,
        node: &Native,
        instance: &mut DeserializedObject,
    ) -> Result<(), DeserializationError> {
        match node {
            Native::Mapping(map) => self.deserialize_object(cx, map, instance),
            Native::Scalar(s) if s.is_null() => Ok(()),
            other => Err(unexpected("a mapping", other)),
        }
    }

    /// Creates the container for `map`, as the configured class name says.
    pub fn create_instance(
        &self,
        cx: &Context<'_>,
        map: &NativeMap,
    ) -> Result<DeserializedObject, DeserializationError> {
        let object = match &self.config.class_name {
            Some(ClassName::Key(key)) => {
                let identifier = map
                    .get(key.as_str())
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| DeserializationError::MissingClassKey { key: key.clone() })?;
                let meta = cx.registry().resolve(identifier)?;
                debug!("{}: creating `{}`", self.name, meta.label());
                meta.instantiate()
            }
            Some(ClassName::Model(meta)) => {
                debug!("{}: creating `{}`", self.name, meta.label());
                meta.instantiate()
            }
            Some(ClassName::Factory(factory)) => {
                debug!("{}: creating through factory", self.name);
                factory()
            }
            None => return Err(DeserializationError::UnresolvedClass),
        };
        Ok(DeserializedObject::new(object))
    }

    /// Rebuilds a nested value: a new object per mapping, element-wise for
    /// sequences, scalars as they are.
    ///
    /// Pending many-to-many data of nested objects is not carried over.
    pub fn restore(&self, cx: &Context<'_>, node: &Native) -> Result<Restored, DeserializationError> {
        match node {
            Native::Scalar(_) => Ok(Restored::Native(node.clone())),
            Native::Sequence(items) => items
                .iter()
                .map(|item| self.restore(cx, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Restored::Sequence),
            Native::Mapping(_) => {
                let instance = self.deserialize(cx, node)?;
                if instance.has_pending_m2m() {
                    warn!("{}: dropping many-to-many data of nested {instance}", self.name);
                }
                Ok(Restored::Object(instance.into_object()))
            }
        }
    }

    fn deserialize_object(
        &self,
        cx: &Context<'_>,
        map: &NativeMap,
        instance: &mut DeserializedObject,
    ) -> Result<(), DeserializationError> {
        let cx = self.scoped(cx);
        let fields = resolve::fields_for_object(&self.schema, &self.config, instance.object())?;
        let model = instance.object().as_model().map(|m| Arc::clone(m.meta()));
        let owner = instance.object().type_name().to_string();

        for (name, descriptor) in fields.iter() {
            let Some(node) = map.get(descriptor.output_key(name)) else {
                continue;
            };
            trace!("{}: deserializing `{name}` into `{owner}`", self.name);
            match descriptor.kind() {
                DescriptorKind::Field { field, .. } => {
                    let target = FieldTarget {
                        name,
                        owner: &owner,
                        model: model.as_deref(),
                    };
                    let value = field.deserialize(&cx, node, &target)?;
                    field.set_object(value, instance, &target)?;
                }
                DescriptorKind::Serializer(nested) => {
                    if descriptor.options().follow_object {
                        let value = nested.restore(&cx, node)?;
                        instance.object_mut().set(name, value)?;
                    } else {
                        nested.deserialize_into(&cx, node, instance)?;
                    }
                }
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// ObjectSerializer as a field

/// Lets a whole serializer stand in wherever a leaf field is expected, e.g.
/// as the member field of a many-to-many relation.
impl Field for ObjectSerializer {
    fn serialize_object(
        &self,
        cx: &Context<'_>,
        value: Value<'_>,
    ) -> Result<Native, SerializationError> {
        self.serialize_value(cx, value).map(Node::into_native)
    }

    #[inline]
    fn serialize_item(&self, cx: &Context<'_>, value: Value<'_>) -> Result<Node, SerializationError> {
        self.serialize_value(cx, value)
    }

    fn metadata(&self, metadata: &mut Metadata) {
        metadata.extend(&self.metadata);
    }

    fn deserialize(
        &self,
        cx: &Context<'_>,
        node: &Native,
        _target: &FieldTarget<'_>,
    ) -> Result<Restored, DeserializationError> {
        self.restore(cx, node)
    }
}
