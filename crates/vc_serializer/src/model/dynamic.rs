use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use vc_utils::OrderedMap;

use super::{Model, ModelMeta, Object, Restored, Value};
use crate::error::DeserializationError;
use crate::native::{Native, Node, Scalar};

// -----------------------------------------------------------------------------
// Slot

#[derive(Clone)]
enum Slot {
    Native(Native),
    Object(Arc<dyn Object>),
    Objects(Vec<Arc<dyn Object>>),
}

impl Slot {
    fn from_restored(value: Restored) -> Option<Self> {
        match value {
            Restored::Native(n) => Some(Self::Native(n)),
            Restored::Object(o) => Some(Self::Object(Arc::from(o))),
            Restored::Sequence(items) => {
                if items.iter().all(|i| matches!(i, Restored::Native(_))) {
                    let nodes = items
                        .into_iter()
                        .filter_map(|i| match i {
                            Restored::Native(n) => Some(Node::new(n)),
                            _ => None,
                        })
                        .collect();
                    Some(Self::Native(Native::Sequence(nodes)))
                } else {
                    items
                        .into_iter()
                        .map(|i| match i {
                            Restored::Object(o) => Some(Arc::<dyn Object>::from(o)),
                            _ => None,
                        })
                        .collect::<Option<Vec<_>>>()
                        .map(Self::Objects)
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// DynamicModel

/// A model instance backed by its [`ModelMeta`] and a bag of values.
///
/// Values are stored under the name they are assigned with; relation fields
/// keep the related instance under the field name and its key under the
/// attname.
///
/// # Examples
///
/// ```
/// use vc_serializer::model::{DynamicModel, FieldMeta, Model, ModelMeta, Object, ScalarKind};
/// use vc_serializer::native::Scalar;
///
/// let author = ModelMeta::builder("blog", "Author")
///     .field(FieldMeta::new("name", ScalarKind::Str))
///     .build();
/// let article = ModelMeta::builder("blog", "Article")
///     .field(FieldMeta::foreign_key("author", "blog.author", ScalarKind::Int))
///     .build();
///
/// let jane = DynamicModel::new(author).with("id", 3).with("name", "Jane");
/// let post = DynamicModel::new(article).with("id", 1).with_related("author", jane);
///
/// assert_eq!(post.pk(), Scalar::Int(1));
/// assert_eq!(post.scalar("author_id"), Scalar::Int(3));
/// assert!(post.get("author").is_some());
/// ```
#[derive(Clone)]
pub struct DynamicModel {
    meta: Arc<ModelMeta>,
    slots: OrderedMap<String, Slot>,
}

impl DynamicModel {
    #[inline]
    pub fn new(meta: Arc<ModelMeta>) -> Self {
        Self {
            meta,
            slots: OrderedMap::new(),
        }
    }

    /// Sets a plain value.
    pub fn with(mut self, name: &str, value: impl Into<Native>) -> Self {
        self.slots.insert(name.to_string(), Slot::Native(value.into()));
        self
    }

    /// Links a related instance and stores its key under the field's attname.
    pub fn with_related(mut self, name: &str, related: impl Model + 'static) -> Self {
        if let Some(field) = self.meta.field(name)
            && field.attname() != name
        {
            let attname = field.attname().to_string();
            self.slots.insert(attname, Slot::Native(Native::Scalar(related.pk())));
        }
        self.slots.insert(name.to_string(), Slot::Object(Arc::new(related)));
        self
    }

    /// Appends an instance to a many-valued relation.
    pub fn with_many(mut self, name: &str, related: impl Model + 'static) -> Self {
        let related: Arc<dyn Object> = Arc::new(related);
        match self.slots.get_mut(name) {
            Some(Slot::Objects(items)) => items.push(related),
            _ => {
                self.slots.insert(name.to_string(), Slot::Objects(Vec::from([related])));
            }
        }
        self
    }

    /// The raw value stored under `name`, if it is a native value.
    pub fn native(&self, name: &str) -> Option<&Native> {
        match self.slots.get(name) {
            Some(Slot::Native(n)) => Some(n),
            _ => None,
        }
    }

    /// The scalar stored under `name`; `Null` when unset.
    pub fn scalar(&self, name: &str) -> Scalar {
        match self.native(name) {
            Some(Native::Scalar(s)) => s.clone(),
            _ => Scalar::Null,
        }
    }
}

impl Object for DynamicModel {
    #[inline]
    fn type_name(&self) -> &str {
        self.meta.object_name()
    }

    fn field_names(&self) -> Vec<String> {
        self.meta
            .fields()
            .iter()
            .filter(|f| f.is_serialized())
            .map(|f| f.name().to_string())
            .collect()
    }

    fn get(&self, name: &str) -> Option<Value<'_>> {
        match self.slots.get(name) {
            Some(Slot::Native(n)) => Some(Value::from_native(n)),
            Some(Slot::Object(o)) => Some(Value::Object(&**o)),
            Some(Slot::Objects(items)) => Some(Value::sequence(
                items.iter().map(|o| Value::Object(&**o)),
            )),
            None => {
                let field = self.meta.field(name)?;
                if field.is_many_to_many() {
                    Some(Value::sequence(core::iter::empty()))
                } else {
                    Some(Value::Scalar(Scalar::Null))
                }
            }
        }
    }

    fn set(&mut self, name: &str, value: Restored) -> Result<(), DeserializationError> {
        let slot = Slot::from_restored(value).ok_or_else(|| DeserializationError::Attribute {
            object: self.meta.label().to_string(),
            field: name.to_string(),
            reason: "a sequence must hold only native values or only objects",
        })?;
        self.slots.insert(name.to_string(), slot);
        Ok(())
    }

    #[inline]
    fn as_model(&self) -> Option<&dyn Model> {
        Some(self)
    }
}

impl Model for DynamicModel {
    #[inline]
    fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    #[inline]
    fn pk(&self) -> Scalar {
        self.scalar(self.meta.pk().attname())
    }

    fn natural_key(&self) -> Option<Vec<Scalar>> {
        let names = self.meta.natural_key()?;
        Some(names.iter().map(|n| self.scalar(n)).collect())
    }
}
