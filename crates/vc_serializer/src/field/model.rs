use alloc::string::ToString;
use alloc::vec::Vec;

use super::{Field, FieldTarget, as_model, model_field, required_name, unexpected};
use crate::container::DeserializedObject;
use crate::engine::Context;
use crate::error::{DeserializationError, SerializationError};
use crate::model::{Object, Restored, ScalarKind, Value};
use crate::native::{Native, Scalar};

fn coerce(kind: ScalarKind, node: &Native, target: &FieldTarget<'_>) -> Result<Restored, DeserializationError> {
    match node {
        Native::Scalar(s) => kind
            .coerce(s)
            .map(|s| Restored::Native(Native::Scalar(s)))
            .map_err(|reason| target.conversion(reason)),
        Native::Sequence(items) => items
            .iter()
            .map(|item| coerce(kind, item, target))
            .collect::<Result<Vec<_>, _>>()
            .map(Restored::Sequence),
        Native::Mapping(_) => Err(unexpected("a scalar", node)),
    }
}

// -----------------------------------------------------------------------------
// ModelField

/// A concrete model field.
///
/// Reads the stored value and, on the way back, coerces the native value to
/// the field's type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelField;

impl Field for ModelField {
    fn get_object<'a>(
        &self,
        _cx: &Context<'_>,
        source: &'a dyn Object,
        name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        let name = required_name(name, "ModelField")?;
        let model = as_model(source, name)?;
        let field = model_field(model, name)?;
        match source.get(field.attname()) {
            Some(Value::Scalar(s)) => Ok(Value::Scalar(s)),
            None => Ok(Value::Scalar(Scalar::Null)),
            Some(other) => Err(SerializationError::NotNative {
                object: other.kind_name().to_string(),
            }),
        }
    }

    fn deserialize(
        &self,
        _cx: &Context<'_>,
        node: &Native,
        target: &FieldTarget<'_>,
    ) -> Result<Restored, DeserializationError> {
        let field = target.model_field()?;
        coerce(field.kind(), node, target)
    }
}

// -----------------------------------------------------------------------------
// PrimaryKeyField

/// The primary key of a model instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryKeyField;

impl Field for PrimaryKeyField {
    fn get_object<'a>(
        &self,
        _cx: &Context<'_>,
        source: &'a dyn Object,
        _name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        let model = as_model(source, "pk")?;
        Ok(Value::Scalar(model.pk()))
    }

    fn deserialize(
        &self,
        _cx: &Context<'_>,
        node: &Native,
        target: &FieldTarget<'_>,
    ) -> Result<Restored, DeserializationError> {
        let pk = target.model()?.pk();
        coerce(pk.kind(), node, target)
    }

    fn set_object(
        &self,
        value: Restored,
        instance: &mut DeserializedObject,
        target: &FieldTarget<'_>,
    ) -> Result<(), DeserializationError> {
        let attname = target.model()?.pk().attname();
        instance.object_mut().set(attname, value)
    }
}

// -----------------------------------------------------------------------------
// ModelNameField

/// The `app_label.model_name` label of a model instance. Output only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelNameField;

impl Field for ModelNameField {
    fn get_object<'a>(
        &self,
        _cx: &Context<'_>,
        source: &'a dyn Object,
        _name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        let model = as_model(source, "model")?;
        Ok(Value::Scalar(Scalar::from(model.meta().label())))
    }

    fn set_object(
        &self,
        _value: Restored,
        _instance: &mut DeserializedObject,
        _target: &FieldTarget<'_>,
    ) -> Result<(), DeserializationError> {
        Ok(())
    }
}
