use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{DeserializationError, SerializationError};
use crate::model::ModelMeta;
use crate::native::{Native, NativeMap, Node, Scalar};

// -----------------------------------------------------------------------------
// Value

/// A source value, already classified.
///
/// Classification happens once, when the value is read off its owner, so a
/// string is always a [`Scalar`] and never a sequence of characters.
///
/// # Single pass
///
/// [`Value::Sequence`] wraps an iterator. It can be walked exactly once; a
/// consumer that needs the items twice must collect them itself.
pub enum Value<'a> {
    Scalar(Scalar),
    Mapping(Vec<(String, Value<'a>)>),
    Sequence(Box<dyn Iterator<Item = Value<'a>> + 'a>),
    Object(&'a dyn Object),
}

impl<'a> Value<'a> {
    /// Wraps an iterator as a single-pass sequence.
    #[inline]
    pub fn sequence(iter: impl Iterator<Item = Value<'a>> + 'a) -> Self {
        Self::Sequence(Box::new(iter))
    }

    /// Borrows a native tree as a source value.
    pub fn from_native(native: &'a Native) -> Self {
        match native {
            Native::Scalar(s) => Self::Scalar(s.clone()),
            Native::Mapping(map) => Self::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_native(&v.value)))
                    .collect(),
            ),
            Native::Sequence(seq) => Self::sequence(seq.iter().map(|n| Value::from_native(&n.value))),
        }
    }

    /// A short name of the shape, used in logs and error messages.
    pub fn kind_name(&self) -> &str {
        match self {
            Self::Scalar(s) => s.kind_name(),
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
            Self::Object(o) => o.type_name(),
        }
    }

    /// Converts to a native tree without any schema.
    ///
    /// Scalars pass through, mappings and sequences convert element-wise.
    /// Objects have no schema-less native form and fail.
    pub fn into_native(self) -> Result<Native, SerializationError> {
        match self {
            Self::Scalar(s) => Ok(Native::Scalar(s)),
            Self::Mapping(entries) => {
                let mut map = NativeMap::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key, Node::new(value.into_native()?));
                }
                Ok(Native::Mapping(map))
            }
            Self::Sequence(items) => items
                .map(|v| v.into_native().map(Node::new))
                .collect::<Result<Vec<_>, _>>()
                .map(Native::Sequence),
            Self::Object(o) => Err(SerializationError::NotNative {
                object: o.type_name().to_string(),
            }),
        }
    }
}

impl From<Scalar> for Value<'_> {
    #[inline]
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            Self::Mapping(m) => f.debug_tuple("Mapping").field(m).finish(),
            Self::Sequence(_) => f.write_str("Sequence(..)"),
            Self::Object(o) => write!(f, "Object({})", o.type_name()),
        }
    }
}

// -----------------------------------------------------------------------------
// Restored

/// A value rebuilt from a native tree, ready to be assigned to an object.
pub enum Restored {
    Native(Native),
    Object(Box<dyn Object>),
    Sequence(Vec<Restored>),
}

impl Restored {
    /// Returns the scalar, if this is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Native(n) => n.as_scalar(),
            _ => None,
        }
    }

    /// Reduces the value to a key usable as a relation target.
    ///
    /// Scalars are taken as-is and model instances by primary key.
    pub fn into_key(self) -> Option<Scalar> {
        match self {
            Self::Native(Native::Scalar(s)) => Some(s),
            Self::Object(o) => o.as_model().map(|m| m.pk()),
            _ => None,
        }
    }
}

impl fmt::Debug for Restored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(n) => f.debug_tuple("Native").field(n).finish(),
            Self::Object(o) => write!(f, "Object({})", o.type_name()),
            Self::Sequence(s) => f.debug_tuple("Sequence").field(s).finish(),
        }
    }
}

impl From<Native> for Restored {
    #[inline]
    fn from(value: Native) -> Self {
        Self::Native(value)
    }
}

// -----------------------------------------------------------------------------
// Object

/// An introspectable source or target of serialization.
///
/// This is the attribute-access capability: read a named value, write a
/// named value, enumerate the names worth serializing.
pub trait Object {
    /// A human readable type name.
    fn type_name(&self) -> &str;

    /// Names of the values that should be serialized, in order.
    fn field_names(&self) -> Vec<String>;

    /// Reads the value called `name`, or `None` if there is no such value.
    fn get(&self, name: &str) -> Option<Value<'_>>;

    /// Assigns the value called `name`.
    fn set(&mut self, name: &str, value: Restored) -> Result<(), DeserializationError>;

    /// Returns the model view of this object, if it is a model instance.
    #[inline]
    fn as_model(&self) -> Option<&dyn Model> {
        None
    }
}

// -----------------------------------------------------------------------------
// Model

/// A model instance: an object with a schema, a primary key and possibly
/// a natural key.
pub trait Model: Object {
    fn meta(&self) -> &Arc<ModelMeta>;

    fn pk(&self) -> Scalar;

    /// The business identifier of this instance, if its model defines one.
    #[inline]
    fn natural_key(&self) -> Option<Vec<Scalar>> {
        None
    }
}
