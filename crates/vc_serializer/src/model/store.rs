use alloc::string::{String, ToString};
use alloc::vec::Vec;

use log::debug;
use vc_utils::OrderedMap;

use super::{Model, Object, Value};
use crate::error::StoreError;
use crate::native::{NativeMap, Node, Scalar};

// -----------------------------------------------------------------------------
// Capabilities

/// Raw persistence of model instances.
pub trait Store {
    /// Writes the instance exactly as it is, bypassing any save hooks.
    fn save_raw(&mut self, object: &dyn Object) -> Result<(), StoreError>;

    /// Replaces the members of a many-valued relation in bulk.
    fn assign_related(
        &mut self,
        object: &dyn Object,
        accessor: &str,
        keys: &[Scalar],
    ) -> Result<(), StoreError>;
}

/// Resolves natural keys to primary keys.
pub trait NaturalKeyLookup {
    /// Returns the primary key of the `model` instance whose natural key is
    /// `key`, if there is one.
    fn get_by_natural_key(&self, model: &str, key: &[Scalar]) -> Option<Scalar>;
}

// -----------------------------------------------------------------------------
// MemoryStore

/// One persisted instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub pk: Scalar,
    pub natural_key: Option<Vec<Scalar>>,
    pub values: NativeMap,
}

/// An in-memory [`Store`] and [`NaturalKeyLookup`].
///
/// Rows are keyed by model label and the display form of the primary key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: OrderedMap<(String, String), Row>,
    relations: OrderedMap<(String, String, String), Vec<Scalar>>,
    assignments: usize,
}

fn model_of(object: &dyn Object) -> Result<&dyn Model, StoreError> {
    object.as_model().ok_or_else(|| StoreError::NotAModel {
        object: object.type_name().to_string(),
    })
}

impl MemoryStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, model: &str, pk: &Scalar) -> Option<&Row> {
        self.rows.get(&(model.to_lowercase(), pk.to_string()))
    }

    /// Current members of a many-valued relation.
    pub fn related(&self, model: &str, pk: &Scalar, accessor: &str) -> &[Scalar] {
        let key = (model.to_lowercase(), pk.to_string(), accessor.to_string());
        self.relations.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// How many relation assignments have been applied so far.
    #[inline]
    pub fn assignments(&self) -> usize {
        self.assignments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stores a snapshot of a model directly, e.g. to seed lookups.
    pub fn insert(&mut self, model: &dyn Model) {
        let meta = model.meta();
        let mut values = NativeMap::new();
        for field in meta.fields() {
            if field.is_many_to_many() {
                continue;
            }
            if let Some(Value::Scalar(s)) = model.get(field.attname()) {
                values.insert(field.attname().to_string(), Node::new(s));
            }
        }
        let pk = model.pk();
        let key = (meta.label().to_string(), pk.to_string());
        self.rows.insert(
            key,
            Row {
                pk,
                natural_key: model.natural_key(),
                values,
            },
        );
    }
}

impl Store for MemoryStore {
    fn save_raw(&mut self, object: &dyn Object) -> Result<(), StoreError> {
        let model = model_of(object)?;
        debug!("raw save of `{}` pk={}", model.meta().label(), model.pk());
        self.insert(model);
        Ok(())
    }

    fn assign_related(
        &mut self,
        object: &dyn Object,
        accessor: &str,
        keys: &[Scalar],
    ) -> Result<(), StoreError> {
        let model = model_of(object)?;
        let key = (
            model.meta().label().to_string(),
            model.pk().to_string(),
            accessor.to_string(),
        );
        debug!("assigning {} keys to `{}.{accessor}`", keys.len(), key.0);
        self.relations.insert(key, keys.to_vec());
        self.assignments += 1;
        Ok(())
    }
}

impl NaturalKeyLookup for MemoryStore {
    fn get_by_natural_key(&self, model: &str, key: &[Scalar]) -> Option<Scalar> {
        let model = model.to_lowercase();
        self.rows
            .iter()
            .find(|((label, _), row)| *label == model && row.natural_key.as_deref() == Some(key))
            .map(|(_, row)| row.pk.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStore, NaturalKeyLookup, Store};
    use crate::model::{DynamicModel, FieldMeta, ModelMeta, ScalarKind};
    use crate::native::Scalar;

    fn tag(pk: i64, name: &str) -> DynamicModel {
        let meta = ModelMeta::builder("blog", "Tag")
            .field(FieldMeta::new("name", ScalarKind::Str))
            .natural_key(["name"])
            .build();
        DynamicModel::new(meta).with("id", pk).with("name", name)
    }

    #[test]
    fn save_then_lookup_by_natural_key() {
        let mut store = MemoryStore::new();
        store.save_raw(&tag(4, "rust")).unwrap();
        store.save_raw(&tag(5, "serde")).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get_by_natural_key("Blog.Tag", &[Scalar::from("serde")]),
            Some(Scalar::Int(5))
        );
        assert_eq!(store.get_by_natural_key("blog.tag", &[Scalar::from("go")]), None);
    }

    #[test]
    fn resaving_replaces_the_row() {
        let mut store = MemoryStore::new();
        store.save_raw(&tag(4, "rust")).unwrap();
        store.save_raw(&tag(4, "rustlang")).unwrap();
        assert_eq!(store.len(), 1);
        let row = store.row("blog.tag", &Scalar::Int(4)).unwrap();
        assert_eq!(row.values.get("name").unwrap().as_str(), Some("rustlang"));
    }

    #[test]
    fn relation_assignment_replaces_members() {
        let mut store = MemoryStore::new();
        let owner = tag(1, "owner");
        store.assign_related(&owner, "tags", &[Scalar::Int(2), Scalar::Int(3)]).unwrap();
        store.assign_related(&owner, "tags", &[Scalar::Int(3)]).unwrap();
        assert_eq!(store.related("blog.tag", &Scalar::Int(1), "tags"), [Scalar::Int(3)]);
        assert_eq!(store.assignments(), 2);
    }
}
