//! Field descriptors and the built-in leaf fields.
//!
//! A [`Field`] is a set of hooks. The engine calls them in a fixed order:
//!
//! - serialize: [`get_object`](Field::get_object), then either
//!   [`serialize_object`](Field::serialize_object) or, per item of a
//!   sequence, [`serialize_item`](Field::serialize_item); the result carries
//!   whatever [`metadata`](Field::metadata) adds.
//! - deserialize: [`deserialize`](Field::deserialize), then
//!   [`set_object`](Field::set_object).
//!
//! Every hook has a default, so a custom field overrides only what it needs.

mod descriptor;
mod model;
mod plain;
mod related;

pub use descriptor::{DescriptorKind, FieldDescriptor, FieldOptions};
pub use model::{ModelField, ModelNameField, PrimaryKeyField};
pub use plain::PlainField;
pub use related::{M2mField, M2mRelatedField, RelatedField};

use alloc::string::ToString;

use crate::container::DeserializedObject;
use crate::engine::Context;
use crate::error::{DeserializationError, SerializationError};
use crate::model::{FieldMeta, Model, ModelMeta, Object, Restored, Value};
use crate::native::{Metadata, Native, Node};

// -----------------------------------------------------------------------------
// Field

/// Symmetric serialize/deserialize behavior for one attribute.
pub trait Field: Send + Sync + 'static {
    /// Extracts the value to serialize.
    ///
    /// `name` is `None` when the descriptor does not follow the object. The
    /// default reads the attribute when there is one and otherwise hands back
    /// the source itself.
    fn get_object<'a>(
        &self,
        cx: &Context<'_>,
        source: &'a dyn Object,
        name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        let _ = cx;
        Ok(name
            .and_then(|name| source.get(name))
            .unwrap_or(Value::Object(source)))
    }

    /// Converts a non-sequence value. Scalars and mappings of scalars pass.
    fn serialize_object(
        &self,
        cx: &Context<'_>,
        value: Value<'_>,
    ) -> Result<Native, SerializationError> {
        let _ = cx;
        value.into_native()
    }

    /// Converts one item of a sequence value.
    fn serialize_item(&self, cx: &Context<'_>, value: Value<'_>) -> Result<Node, SerializationError> {
        let native = self.serialize_object(cx, value)?;
        let mut metadata = Metadata::new();
        self.metadata(&mut metadata);
        Ok(Node::with_metadata(native, metadata))
    }

    /// Adds renderer hints to produced nodes.
    fn metadata(&self, metadata: &mut Metadata) {
        let _ = metadata;
    }

    /// Rebuilds the value to assign from its native form.
    fn deserialize(
        &self,
        cx: &Context<'_>,
        node: &Native,
        target: &FieldTarget<'_>,
    ) -> Result<Restored, DeserializationError> {
        let _ = (cx, target);
        Ok(Restored::Native(node.clone()))
    }

    /// Assigns a rebuilt value. Override with a no-op for one-way fields.
    fn set_object(
        &self,
        value: Restored,
        instance: &mut DeserializedObject,
        target: &FieldTarget<'_>,
    ) -> Result<(), DeserializationError> {
        instance.object_mut().set(target.name, value)
    }
}

// -----------------------------------------------------------------------------
// FieldTarget

/// Where a deserialized value is going.
#[derive(Debug, Clone, Copy)]
pub struct FieldTarget<'a> {
    /// Schema name of the field.
    pub name: &'a str,
    /// Type name of the instance being filled.
    pub owner: &'a str,
    /// The instance's model, if it is a model instance.
    pub model: Option<&'a ModelMeta>,
}

impl<'a> FieldTarget<'a> {
    /// The instance's model, or an error naming this field.
    pub fn model(&self) -> Result<&'a ModelMeta, DeserializationError> {
        self.model.ok_or_else(|| self.refuse("target is not a model instance"))
    }

    /// The model field this target names.
    pub fn model_field(&self) -> Result<&'a FieldMeta, DeserializationError> {
        self.model()?
            .field(self.name)
            .ok_or_else(|| self.refuse("no such model field"))
    }

    /// A conversion failure for this field.
    pub fn conversion(&self, reason: impl ToString) -> DeserializationError {
        DeserializationError::Conversion {
            field: self.name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn refuse(&self, reason: &'static str) -> DeserializationError {
        DeserializationError::Attribute {
            object: self.owner.to_string(),
            field: self.name.to_string(),
            reason,
        }
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// Model-backed fields need an attribute name to look up their model field.
fn required_name<'n>(name: Option<&'n str>, field: &str) -> Result<&'n str, SerializationError> {
    name.ok_or_else(|| SerializationError::UnresolvedFlatten {
        field: field.to_string(),
    })
}

fn as_model<'a>(source: &'a dyn Object, field: &str) -> Result<&'a dyn Model, SerializationError> {
    source.as_model().ok_or_else(|| SerializationError::NotAModel {
        field: field.to_string(),
        object: source.type_name().to_string(),
    })
}

fn model_field<'a>(model: &'a dyn Model, name: &str) -> Result<&'a FieldMeta, SerializationError> {
    model
        .meta()
        .field(name)
        .ok_or_else(|| SerializationError::MissingAttribute {
            object: model.meta().label().to_string(),
            field: name.to_string(),
        })
}

fn unexpected(expected: &'static str, found: &Native) -> DeserializationError {
    DeserializationError::UnexpectedShape {
        expected,
        found: found.kind_name(),
    }
}
