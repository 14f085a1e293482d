use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use super::{Field, FieldTarget, as_model, model_field, required_name, unexpected};
use crate::container::DeserializedObject;
use crate::engine::Context;
use crate::error::{DeserializationError, SerializationError};
use crate::model::{FieldMeta, Object, Restored, Value};
use crate::native::{Metadata, Native, Node, Scalar};

fn related_label(field: &FieldMeta, target: &FieldTarget<'_>) -> Result<String, DeserializationError> {
    field
        .relation()
        .map(|rel| rel.to.clone())
        .ok_or_else(|| target.refuse("not a relation field"))
}

/// Resolves a primary key or a natural key of the model `to` to a primary key.
fn restore_key(
    cx: &Context<'_>,
    node: &Native,
    field: &FieldMeta,
    target: &FieldTarget<'_>,
) -> Result<Scalar, DeserializationError> {
    match node {
        Native::Sequence(parts) => {
            let to = related_label(field, target)?;
            let key = parts
                .iter()
                .map(|part| {
                    part.as_scalar()
                        .cloned()
                        .ok_or_else(|| unexpected("a natural key component", part))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let lookup = cx
                .lookup()
                .ok_or_else(|| DeserializationError::NoLookup { model: to.clone() })?;
            lookup
                .get_by_natural_key(&to, &key)
                .ok_or_else(|| DeserializationError::NaturalKeyNotFound {
                    model: to,
                    key: format!("{key:?}"),
                })
        }
        Native::Scalar(s) => field.kind().coerce(s).map_err(|reason| target.conversion(reason)),
        Native::Mapping(_) => Err(unexpected("a key", node)),
    }
}

fn natural_key_value<'a>(key: Vec<Scalar>) -> Value<'a> {
    Value::sequence(key.into_iter().map(Value::Scalar))
}

// -----------------------------------------------------------------------------
// RelatedField

/// A foreign key or one-to-one link.
///
/// Serializes as the raw key, or as the related instance's natural key when
/// natural keys are requested and the instance has one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelatedField;

impl Field for RelatedField {
    fn get_object<'a>(
        &self,
        cx: &Context<'_>,
        source: &'a dyn Object,
        name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        let name = required_name(name, "RelatedField")?;
        let model = as_model(source, name)?;
        let field = model_field(model, name)?;
        if cx.use_natural_keys()
            && let Some(Value::Object(related)) = source.get(field.name())
            && let Some(key) = related.as_model().and_then(|m| m.natural_key())
        {
            return Ok(natural_key_value(key));
        }
        Ok(source
            .get(field.attname())
            .unwrap_or(Value::Scalar(Scalar::Null)))
    }

    fn metadata(&self, metadata: &mut Metadata) {
        metadata.set_item_name("natural");
    }

    fn deserialize(
        &self,
        cx: &Context<'_>,
        node: &Native,
        target: &FieldTarget<'_>,
    ) -> Result<Restored, DeserializationError> {
        let field = target.model_field()?;
        restore_key(cx, node, field, target).map(|key| Restored::Native(Native::Scalar(key)))
    }

    fn set_object(
        &self,
        value: Restored,
        instance: &mut DeserializedObject,
        target: &FieldTarget<'_>,
    ) -> Result<(), DeserializationError> {
        let attname = target.model_field()?.attname();
        instance.object_mut().set(attname, value)
    }
}

// -----------------------------------------------------------------------------
// M2mRelatedField

/// One member of a many-to-many relation: its primary key or natural key.
#[derive(Debug, Clone, Copy, Default)]
pub struct M2mRelatedField;

impl Field for M2mRelatedField {
    fn serialize_object(
        &self,
        cx: &Context<'_>,
        value: Value<'_>,
    ) -> Result<Native, SerializationError> {
        let related = match value {
            Value::Object(related) => related,
            other => return other.into_native(),
        };
        let model = as_model(related, "M2mRelatedField")?;
        if cx.use_natural_keys()
            && let Some(key) = model.natural_key()
        {
            return Ok(Native::Sequence(key.into_iter().map(Node::new).collect()));
        }
        Ok(Native::Scalar(model.pk()))
    }

    fn metadata(&self, metadata: &mut Metadata) {
        metadata.set_item_name("natural");
    }

    fn deserialize(
        &self,
        cx: &Context<'_>,
        node: &Native,
        target: &FieldTarget<'_>,
    ) -> Result<Restored, DeserializationError> {
        let field = target.model_field()?;
        restore_key(cx, node, field, target).map(|key| Restored::Native(Native::Scalar(key)))
    }
}

// -----------------------------------------------------------------------------
// M2mField

/// A many-to-many relation through a generated table.
///
/// Each member goes through the related field, [`M2mRelatedField`] unless
/// another one is plugged in. Rebuilt keys are queued on the container rather
/// than assigned, and reach the store on
/// [`persist`](DeserializedObject::persist).
#[derive(Clone)]
pub struct M2mField {
    related: Arc<dyn Field>,
}

impl Default for M2mField {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for M2mField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("M2mField").finish_non_exhaustive()
    }
}

impl M2mField {
    #[inline]
    pub fn new() -> Self {
        Self {
            related: Arc::new(M2mRelatedField),
        }
    }

    /// Uses `related` for each member of the relation.
    #[inline]
    pub fn with_related(related: impl Field) -> Self {
        Self {
            related: Arc::new(related),
        }
    }
}

impl Field for M2mField {
    fn get_object<'a>(
        &self,
        _cx: &Context<'_>,
        source: &'a dyn Object,
        name: Option<&str>,
    ) -> Result<Value<'a>, SerializationError> {
        let name = required_name(name, "M2mField")?;
        let model = as_model(source, name)?;
        let field = model_field(model, name)?;
        let auto_created = field
            .relation()
            .is_some_and(|rel| field.is_many_to_many() && rel.auto_created);
        if !auto_created {
            return Err(SerializationError::Restricted {
                field: name.to_string(),
                reason: "only auto-created many-to-many relations can be serialized",
            });
        }
        match source.get(name) {
            Some(Value::Scalar(Scalar::Null)) | None => Ok(Value::sequence(core::iter::empty())),
            Some(value) => Ok(value),
        }
    }

    #[inline]
    fn serialize_object(
        &self,
        cx: &Context<'_>,
        value: Value<'_>,
    ) -> Result<Native, SerializationError> {
        self.related.serialize_object(cx, value)
    }

    #[inline]
    fn serialize_item(&self, cx: &Context<'_>, value: Value<'_>) -> Result<Node, SerializationError> {
        self.related.serialize_item(cx, value)
    }

    fn metadata(&self, metadata: &mut Metadata) {
        metadata.set_item_name("object");
    }

    fn deserialize(
        &self,
        cx: &Context<'_>,
        node: &Native,
        target: &FieldTarget<'_>,
    ) -> Result<Restored, DeserializationError> {
        match node {
            Native::Sequence(items) => items
                .iter()
                .map(|item| self.related.deserialize(cx, item, target))
                .collect::<Result<Vec<_>, _>>()
                .map(Restored::Sequence),
            Native::Scalar(Scalar::Null) => Ok(Restored::Sequence(Vec::new())),
            other => Err(unexpected("a sequence", other)),
        }
    }

    fn set_object(
        &self,
        value: Restored,
        instance: &mut DeserializedObject,
        target: &FieldTarget<'_>,
    ) -> Result<(), DeserializationError> {
        let items = match value {
            Restored::Sequence(items) => items,
            single => Vec::from([single]),
        };
        let keys = items
            .into_iter()
            .map(|item| item.into_key().ok_or_else(|| target.refuse("member has no key")))
            .collect::<Result<Vec<_>, _>>()?;
        instance.set_m2m(target.name, keys);
        Ok(())
    }
}
