//! Fields describing a model field rather than its value, rendered as XML
//! attributes.

use alloc::string::ToString;

use vc_serializer::field::{Field, FieldTarget};
use vc_serializer::model::{FieldMeta, Object, Restored, Value};
use vc_serializer::native::{Metadata, Native, Node, Scalar};
use vc_serializer::{Context, DeserializationError, DeserializedObject, SerializationError};

/// The model field behind `name` on `source`.
fn field_meta<'a>(
    source: &'a dyn Object,
    name: Option<&str>,
    kind: &str,
) -> Result<&'a FieldMeta, SerializationError> {
    let name = name.ok_or_else(|| SerializationError::UnresolvedFlatten {
        field: kind.to_string(),
    })?;
    let model = source.as_model().ok_or_else(|| SerializationError::NotAModel {
        field: name.to_string(),
        object: source.type_name().to_string(),
    })?;
    model
        .meta()
        .field(name)
        .ok_or_else(|| SerializationError::MissingAttribute {
            object: model.meta().label().to_string(),
            field: name.to_string(),
        })
}

fn text<'a>(value: Option<&str>) -> Value<'a> {
    match value {
        Some(text) => Value::Scalar(Scalar::Str(text.to_string())),
        None => Value::Scalar(Scalar::Null),
    }
}

// -----------------------------------------------------------------------------
// Descriptive fields

/// The internal type of the model field, e.g. `CharField`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeField;

impl Field for TypeField {
    fn get_object<'a>(
        &self,
        _cx: &Context<'_>,
        source: &'a dyn Object,
        name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        let field = field_meta(source, name, "TypeField")?;
        Ok(text(Some(field.get_internal_type())))
    }
}

/// The relation kind of the model field, e.g. `ManyToOneRel`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelField;

impl Field for RelField {
    fn get_object<'a>(
        &self,
        _cx: &Context<'_>,
        source: &'a dyn Object,
        name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        let field = field_meta(source, name, "RelField")?;
        Ok(text(field.relation().map(|rel| rel.kind.name())))
    }
}

/// The label of the related model, e.g. `auth.user`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToField;

impl Field for ToField {
    fn get_object<'a>(
        &self,
        _cx: &Context<'_>,
        source: &'a dyn Object,
        name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        let field = field_meta(source, name, "ToField")?;
        Ok(text(field.relation().map(|rel| rel.to.as_str())))
    }
}

// -----------------------------------------------------------------------------
// TextField

/// Writes the value of `F` in its text form; reads it back through `F`.
///
/// `Null` stays `Null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextField<F>(pub F);

impl<F: Field> Field for TextField<F> {
    #[inline]
    fn get_object<'a>(
        &self,
        cx: &Context<'_>,
        source: &'a dyn Object,
        name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        self.0.get_object(cx, source, name)
    }

    fn serialize_object(
        &self,
        cx: &Context<'_>,
        value: Value<'_>,
    ) -> Result<Native, SerializationError> {
        Ok(match self.0.serialize_object(cx, value)? {
            Native::Scalar(s) if !s.is_null() => Native::Scalar(Scalar::Str(s.to_string())),
            other => other,
        })
    }

    fn serialize_item(&self, cx: &Context<'_>, value: Value<'_>) -> Result<Node, SerializationError> {
        let mut node = Node::new(self.serialize_object(cx, value)?);
        self.0.metadata(node.metadata_mut());
        Ok(node)
    }

    #[inline]
    fn metadata(&self, metadata: &mut Metadata) {
        self.0.metadata(metadata);
    }

    #[inline]
    fn deserialize(
        &self,
        cx: &Context<'_>,
        node: &Native,
        target: &FieldTarget<'_>,
    ) -> Result<Restored, DeserializationError> {
        self.0.deserialize(cx, node, target)
    }

    #[inline]
    fn set_object(
        &self,
        value: Restored,
        instance: &mut DeserializedObject,
        target: &FieldTarget<'_>,
    ) -> Result<(), DeserializationError> {
        self.0.set_object(value, instance, target)
    }
}
