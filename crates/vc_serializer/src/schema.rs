//! Ordered field schemas and their declaration-time assembly.

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use log::debug;
use vc_utils::OrderedMap;
use vc_utils::hash::{FixedHashState, HashSet};

use crate::error::SerializerError;
use crate::field::FieldDescriptor;

/// Name-keyed descriptors in output order.
pub type FieldMap = OrderedMap<String, FieldDescriptor>;

// -----------------------------------------------------------------------------
// Schema

/// An immutable ordered mapping of field names to descriptors.
///
/// Inherited fields come first, followed by local fields in declaration
/// order. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Schema(Arc<FieldMap>);

impl Schema {
    /// A schema with no fields.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn builder(name: &str) -> SchemaBuilder {
        SchemaBuilder {
            name: name.to_string(),
            bases: Vec::new(),
            local: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.0.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&String, &FieldDescriptor)> {
        self.0.iter()
    }

    #[inline]
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns a copy with `name` bound to `descriptor`, in place.
    pub(crate) fn with_replaced(&self, name: &str, descriptor: FieldDescriptor) -> Self {
        let mut map = FieldMap::clone(&self.0);
        map.insert(name.to_string(), descriptor);
        Self(Arc::new(map))
    }
}

impl From<FieldMap> for Schema {
    #[inline]
    fn from(map: FieldMap) -> Self {
        Self(Arc::new(map))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// -----------------------------------------------------------------------------
// SchemaBuilder

/// Collects declared fields and merges them with inherited schemas.
///
/// # Examples
///
/// ```
/// use vc_serializer::field::{FieldDescriptor, PlainField};
/// use vc_serializer::schema::Schema;
///
/// let base = Schema::builder("Base")
///     .field("a", FieldDescriptor::field(PlainField))
///     .field("b", FieldDescriptor::field(PlainField))
///     .build()
///     .unwrap();
///
/// let c = FieldDescriptor::field(PlainField);
/// let child = Schema::builder("Child")
///     .inherit(&base)
///     .field("c", c)
///     .build()
///     .unwrap();
///
/// assert_eq!(child.names().collect::<Vec<_>>(), ["a", "b", "c"]);
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    bases: Vec<Schema>,
    local: Vec<(String, FieldDescriptor)>,
}

impl SchemaBuilder {
    /// Adds an ancestor. Ancestor fields precede local ones, in the order the
    /// ancestors were added.
    pub fn inherit(mut self, base: &Schema) -> Self {
        self.bases.push(base.clone());
        self
    }

    /// Declares a local field.
    pub fn field(mut self, name: &str, descriptor: FieldDescriptor) -> Self {
        self.local.push((name.to_string(), descriptor));
        self
    }

    /// Assembles the schema.
    ///
    /// Local fields are ordered by creation counter. A local field that
    /// redeclares an inherited name replaces the inherited descriptor but
    /// keeps the inherited position.
    pub fn build(self) -> Result<Schema, SerializerError> {
        let Self {
            name,
            bases,
            mut local,
        } = self;

        {
            let mut seen = HashSet::<&str>::with_capacity_and_hasher(local.len(), FixedHashState);
            for (field, descriptor) in &local {
                if !seen.insert(field.as_str()) {
                    return Err(SerializerError::DuplicateField {
                        schema: name,
                        field: field.clone(),
                    });
                }
                if descriptor.options().attribute && descriptor.has_subfields() {
                    return Err(SerializerError::AttributeWithSubfields {
                        field: field.clone(),
                    });
                }
            }
        }
        local.sort_by_key(|(_, d)| d.creation_counter());

        let mut map = FieldMap::new();
        for base in &bases {
            Self::merge(&mut map, base.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Self::merge(&mut map, local);
        debug!("schema `{name}` assembled with {} fields", map.len());
        Ok(Schema(Arc::new(map)))
    }

    fn merge(map: &mut FieldMap, fields: impl IntoIterator<Item = (String, FieldDescriptor)>) {
        for (name, descriptor) in fields {
            map.insert(name, descriptor);
        }
    }
}
