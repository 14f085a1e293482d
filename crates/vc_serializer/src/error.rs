use alloc::string::String;

use thiserror::Error;

// -----------------------------------------------------------------------------
// Lookup

/// The requested format is not registered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown serialization format `{format}`")]
pub struct SerializerDoesNotExist {
    pub format: String,
}

// -----------------------------------------------------------------------------
// Definition time

/// A serializer or schema was declared in an invalid way.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SerializerError {
    #[error("Field `{field}` is rendered as an attribute and cannot declare sub-fields")]
    AttributeWithSubfields { field: String },

    #[error("Field `{field}` is declared twice in `{schema}`")]
    DuplicateField { schema: String, field: String },

    #[error("Field `{field}` is not a nested serializer")]
    NotASerializer { field: String },
}

// -----------------------------------------------------------------------------
// Serialization

/// Producing a native tree failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SerializationError {
    #[error("`{object}` has no attribute `{field}`")]
    MissingAttribute { object: String, field: String },

    #[error("`{field}` declares sub-fields but has no field name to resolve them against")]
    UnresolvedFlatten { field: String },

    #[error("Field `{name}` was requested but is neither declared nor introspectable")]
    UnknownField { name: String },

    #[error("`{field}` cannot be serialized here: {reason}")]
    Restricted { field: String, reason: &'static str },

    #[error("`{field}` requires a model instance, found `{object}`")]
    NotAModel { field: String, object: String },

    #[error("A `{object}` object has no native form")]
    NotNative { object: String },

    #[error("Failed to render `{format}` output: {reason}")]
    Render { format: String, reason: String },
}

// -----------------------------------------------------------------------------
// Deserialization

/// Reconstructing objects from a native tree failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeserializationError {
    #[error("Invalid model identifier: `{0}`")]
    InvalidModelIdentifier(String),

    #[error("Can't resolve class for object creation")]
    UnresolvedClass,

    #[error("Input has no `{key}` entry naming the class to create")]
    MissingClassKey { key: String },

    #[error("Expected {expected} but found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cannot convert value for `{field}`: {reason}")]
    Conversion { field: String, reason: String },

    #[error("No `{model}` instance has natural key {key}")]
    NaturalKeyNotFound { model: String, key: String },

    #[error("Natural key for `{model}` given but no lookup is available")]
    NoLookup { model: String },

    #[error("Cannot assign `{field}` on `{object}`: {reason}")]
    Attribute {
        object: String,
        field: String,
        reason: &'static str,
    },

    #[error("Field `{name}` was requested but is neither declared nor introspectable")]
    UnknownField { name: String },

    #[error("Malformed `{format}` input: {reason}")]
    Format { format: String, reason: String },
}

// -----------------------------------------------------------------------------
// Persistence

/// The persistence capability refused an operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    #[error("`{object}` is not a model instance and cannot be persisted")]
    NotAModel { object: String },

    #[error("Store failure: {0}")]
    Backend(String),
}

// -----------------------------------------------------------------------------
// Error

/// Any failure surfaced by this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    DoesNotExist(#[from] SerializerDoesNotExist),

    #[error(transparent)]
    Serializer(#[from] SerializerError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Deserialization(#[from] DeserializationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// -----------------------------------------------------------------------------
// Resolver failure

/// An explicitly listed field could not be found.
///
/// Raised by field resolution, which runs on both the serialize and the
/// deserialize path; converts into the error kind of whichever path hit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl From<UnknownField> for SerializationError {
    #[inline]
    fn from(value: UnknownField) -> Self {
        Self::UnknownField { name: value.0 }
    }
}

impl From<UnknownField> for DeserializationError {
    #[inline]
    fn from(value: UnknownField) -> Self {
        Self::UnknownField { name: value.0 }
    }
}
