//! Merges declared fields with fields introspected from the object.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use log::debug;

use crate::config::{FieldFactory, SerializerConfig};
use crate::error::UnknownField;
use crate::field::{FieldDescriptor, M2mField, ModelField, PlainField, RelatedField};
use crate::model::Object;
use crate::schema::{FieldMap, Schema};

/// Builds the descriptor of one introspected field.
///
/// The kind follows the model field: many-to-many, other relation, or plain
/// value. Objects that are not models only get plain fields.
fn synthesize(config: &SerializerConfig, object: &dyn Object, name: &str) -> FieldDescriptor {
    let build = |factory: &Option<FieldFactory>, fallback: fn() -> FieldDescriptor| match factory {
        Some(factory) => factory(),
        None => fallback(),
    };
    let field = object.as_model().and_then(|m| m.meta().field(name));
    match field {
        Some(f) if f.is_many_to_many() => build(&config.m2m_serializer, || {
            FieldDescriptor::field(M2mField::new())
        }),
        Some(f) if f.is_relation() => build(&config.related_serializer, || {
            FieldDescriptor::field(RelatedField)
        }),
        Some(_) => build(&config.field_serializer, || FieldDescriptor::field(ModelField)),
        None => build(&config.field_serializer, || FieldDescriptor::field(PlainField)),
    }
}

/// Resolves the fields to walk for `object`.
///
/// 1. Without dynamic fields (`fields` given and empty) the declared schema
///    is used as is.
/// 2. Otherwise the object's field names, minus `exclude`, minus declared
///    names, minus names not in a non-empty `fields`, are synthesized.
/// 3. Declared descriptors win over synthesized ones. With a non-empty
///    `fields` the listed names come first, in listed order, followed by
///    unlisted declared fields; otherwise declared fields come first.
///
/// A listed name that is neither declared nor introspectable is an error. A
/// listed name that is excluded is skipped.
pub(crate) fn fields_for_object(
    declared: &Schema,
    config: &SerializerConfig,
    object: &dyn Object,
) -> Result<Schema, UnknownField> {
    if config.introspects_nothing() {
        return Ok(declared.clone());
    }

    let introspected: Vec<String> = object
        .field_names()
        .into_iter()
        .filter(|name| !config.is_excluded(name))
        .collect();
    let is_dynamic = |name: &str| !declared.contains(name) && introspected.iter().any(|n| n == name);

    let mut map = FieldMap::with_capacity(declared.len() + introspected.len());
    match config.fields.as_deref() {
        Some(listed) => {
            for name in listed {
                if let Some(descriptor) = declared.get(name) {
                    map.insert(name.clone(), descriptor.clone());
                } else if is_dynamic(name) {
                    debug!("synthesizing field `{name}` of `{}`", object.type_name());
                    map.insert(name.clone(), synthesize(config, object, name));
                } else if !config.is_excluded(name) {
                    return Err(UnknownField(name.to_string()));
                }
            }
            for (name, descriptor) in declared.iter() {
                if !map.contains_key(name.as_str()) {
                    map.insert(name.clone(), descriptor.clone());
                }
            }
        }
        None => {
            for (name, descriptor) in declared.iter() {
                map.insert(name.clone(), descriptor.clone());
            }
            for name in &introspected {
                if is_dynamic(name) {
                    debug!("synthesizing field `{name}` of `{}`", object.type_name());
                    map.insert(name.clone(), synthesize(config, object, name));
                }
            }
        }
    }
    Ok(Schema::from(map))
}
