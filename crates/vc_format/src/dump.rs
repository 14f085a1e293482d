//! The `{pk, model, fields}` object layout shared by the built-in formats.
//!
//! ```text
//! { "pk": 7, "model": "blog.article", "fields": { "headline": "Hi", ... } }
//! ```
//!
//! `fields` is a nested serializer over the same object; caller options
//! (`fields`, `exclude`, `use_natural_keys`, ...) are applied to it, not to
//! the outer layout.

use vc_serializer::field::{FieldDescriptor, ModelNameField, PrimaryKeyField};
use vc_serializer::{ConfigPatch, ObjectSerializer, ObjectSerializerBuilder, SerializerError};

/// Name of the nested per-object field set.
pub const FIELDS: &str = "fields";

/// Entry naming the model to instantiate on the way back.
pub const CLASS_KEY: &str = "model";

/// The outer layout around `fields`, left open for format tweaks.
pub fn builder(fields: ObjectSerializer) -> ObjectSerializerBuilder {
    ObjectSerializer::builder("DumpSerializer")
        .field("pk", FieldDescriptor::field(PrimaryKeyField))
        .field(CLASS_KEY, FieldDescriptor::field(ModelNameField))
        .field(FIELDS, FieldDescriptor::serializer(fields).follow_object(false))
        .meta(
            ConfigPatch::new()
                .fields(core::iter::empty::<&str>())
                .class_key(CLASS_KEY),
        )
}

/// The plain layout, with model fields introspected as they are.
pub fn serializer() -> Result<ObjectSerializer, SerializerError> {
    let fields = ObjectSerializer::builder("FieldsSerializer").build()?;
    builder(fields).build()
}
