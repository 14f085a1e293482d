use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use super::Field;
use crate::ObjectSerializer;
use crate::schema::Schema;

// -----------------------------------------------------------------------------
// FieldOptions

/// Per-descriptor options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOptions {
    /// Output key; the schema name is used when unset.
    pub label: Option<String>,
    /// Read the named attribute off the source, or work on the source itself.
    pub follow_object: bool,
    /// Render as an attribute of the parent node rather than a child.
    pub attribute: bool,
}

impl Default for FieldOptions {
    #[inline]
    fn default() -> Self {
        Self {
            label: None,
            follow_object: true,
            attribute: false,
        }
    }
}

// -----------------------------------------------------------------------------
// FieldDescriptor

static CREATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// What a descriptor delegates to.
#[derive(Clone)]
pub enum DescriptorKind {
    /// A leaf field, with optional sub-fields rendered as sibling data.
    Field {
        field: Arc<dyn Field>,
        fields: Schema,
    },
    /// A nested object serializer.
    Serializer(Arc<ObjectSerializer>),
}

/// One named unit of a schema.
///
/// Each descriptor takes a number from a process-wide counter when it is
/// constructed. Schemas sort their local fields by that number, which makes
/// the construction order the declaration order.
///
/// # Examples
///
/// ```
/// use vc_serializer::field::{FieldDescriptor, PlainField};
///
/// let first = FieldDescriptor::field(PlainField);
/// let second = FieldDescriptor::field(PlainField).label("title");
///
/// assert!(first.creation_counter() < second.creation_counter());
/// assert_eq!(second.output_key("headline"), "title");
/// assert_eq!(first.output_key("headline"), "headline");
/// ```
#[derive(Clone)]
pub struct FieldDescriptor {
    creation_counter: u64,
    options: FieldOptions,
    kind: DescriptorKind,
}

impl FieldDescriptor {
    fn with_kind(kind: DescriptorKind) -> Self {
        Self {
            creation_counter: CREATION_COUNTER.fetch_add(1, Ordering::Relaxed),
            options: FieldOptions::default(),
            kind,
        }
    }

    /// A descriptor around a leaf field.
    #[inline]
    pub fn field(field: impl Field) -> Self {
        Self::shared(Arc::new(field))
    }

    /// A descriptor around an already shared leaf field.
    #[inline]
    pub fn shared(field: Arc<dyn Field>) -> Self {
        Self::with_kind(DescriptorKind::Field {
            field,
            fields: Schema::empty(),
        })
    }

    /// A descriptor around a nested object serializer.
    #[inline]
    pub fn serializer(serializer: ObjectSerializer) -> Self {
        Self::with_kind(DescriptorKind::Serializer(Arc::new(serializer)))
    }

    pub fn label(mut self, label: &str) -> Self {
        self.options.label = Some(label.to_string());
        self
    }

    pub fn follow_object(mut self, follow: bool) -> Self {
        self.options.follow_object = follow;
        self
    }

    pub fn attribute(mut self, attribute: bool) -> Self {
        self.options.attribute = attribute;
        self
    }

    /// Declares sub-fields, serialized against the same source and name and
    /// attached to the output as sibling data.
    ///
    /// Has no effect on nested serializers, whose schema is their own.
    pub fn with_fields(mut self, schema: Schema) -> Self {
        if let DescriptorKind::Field { fields, .. } = &mut self.kind {
            *fields = schema;
        }
        self
    }

    /// Replaces the nested serializer, keeping counter and options.
    pub(crate) fn with_serializer(&self, serializer: ObjectSerializer) -> Self {
        Self {
            creation_counter: self.creation_counter,
            options: self.options.clone(),
            kind: DescriptorKind::Serializer(Arc::new(serializer)),
        }
    }

    #[inline]
    pub fn creation_counter(&self) -> u64 {
        self.creation_counter
    }

    #[inline]
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    #[inline]
    pub fn kind(&self) -> &DescriptorKind {
        &self.kind
    }

    /// The key this field is written under when its schema name is `name`.
    #[inline]
    pub fn output_key<'a>(&'a self, name: &'a str) -> &'a str {
        self.options.label.as_deref().unwrap_or(name)
    }

    /// Returns `true` if serializing this field produces nested fields.
    pub fn has_subfields(&self) -> bool {
        match &self.kind {
            DescriptorKind::Field { fields, .. } => !fields.is_empty(),
            DescriptorKind::Serializer(_) => true,
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("FieldDescriptor");
        s.field("creation_counter", &self.creation_counter)
            .field("options", &self.options);
        match &self.kind {
            DescriptorKind::Field { fields, .. } => s.field("fields", fields),
            DescriptorKind::Serializer(ser) => s.field("serializer", &ser.name()),
        };
        s.finish()
    }
}
