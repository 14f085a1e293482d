use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use log::debug;
use vc_utils::OrderedMap;

use crate::error::StoreError;
use crate::model::{Object, Store};
use crate::native::Scalar;

// -----------------------------------------------------------------------------
// DeserializedObject

/// A rebuilt object plus the many-to-many data waiting to be assigned.
///
/// Nothing touches the store until [`persist`](Self::persist) is called.
/// After a failed deserialization the container may be partially filled and
/// must not be persisted.
pub struct DeserializedObject {
    object: Box<dyn Object>,
    m2m_data: Option<OrderedMap<String, Vec<Scalar>>>,
}

impl DeserializedObject {
    #[inline]
    pub fn new(object: Box<dyn Object>) -> Self {
        Self {
            object,
            m2m_data: Some(OrderedMap::new()),
        }
    }

    #[inline]
    pub fn object(&self) -> &dyn Object {
        &*self.object
    }

    #[inline]
    pub fn object_mut(&mut self) -> &mut dyn Object {
        &mut *self.object
    }

    #[inline]
    pub fn into_object(self) -> Box<dyn Object> {
        self.object
    }

    /// Pending relation assignments, keyed by accessor name.
    ///
    /// `None` once the container has been persisted.
    #[inline]
    pub fn m2m_data(&self) -> Option<&OrderedMap<String, Vec<Scalar>>> {
        self.m2m_data.as_ref()
    }

    /// Returns `true` if relation data is waiting to be assigned.
    #[inline]
    pub fn has_pending_m2m(&self) -> bool {
        self.m2m_data.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Queues the members of a many-valued relation.
    pub fn set_m2m(&mut self, accessor: &str, keys: Vec<Scalar>) {
        self.m2m_data
            .get_or_insert_with(OrderedMap::new)
            .insert(accessor.to_string(), keys);
    }

    /// Writes the object with a raw save, then assigns the pending relations.
    ///
    /// Each relation leaves the pending map once it is assigned. On success
    /// the map is cleared whether or not relations were assigned, so calling
    /// this again re-saves the object but never re-applies relation data.
    /// If an assignment fails, that relation and the ones after it stay
    /// pending and a later call retries them.
    pub fn persist(
        &mut self,
        store: &mut dyn Store,
        include_many_to_many: bool,
    ) -> Result<(), StoreError> {
        debug!("persisting {self}");
        store.save_raw(&*self.object)?;
        if include_many_to_many && let Some(pending) = &mut self.m2m_data {
            while let Some((accessor, keys)) = pending.get_index(0) {
                store.assign_related(&*self.object, accessor, keys)?;
                let accessor = accessor.clone();
                pending.remove(&accessor);
            }
        }
        self.m2m_data = None;
        Ok(())
    }
}

impl fmt::Display for DeserializedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.object.as_model() {
            Some(model) => {
                let meta = model.meta();
                write!(
                    f,
                    "<DeserializedObject: {}.{}(pk={})>",
                    meta.app_label(),
                    meta.object_name(),
                    model.pk()
                )
            }
            None => write!(f, "<DeserializedObject: {}>", self.object.type_name()),
        }
    }
}

impl fmt::Debug for DeserializedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeserializedObject")
            .field("object", &self.object.type_name())
            .field("m2m_data", &self.m2m_data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::DeserializedObject;
    use crate::error::StoreError;
    use crate::model::{DynamicModel, FieldMeta, MemoryStore, ModelMeta, Object, ScalarKind, Store};
    use crate::native::Scalar;
    use alloc::boxed::Box;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;

    /// Refuses one accessor until `healed`.
    struct Flaky {
        inner: MemoryStore,
        broken: &'static str,
        healed: bool,
    }

    impl Store for Flaky {
        fn save_raw(&mut self, object: &dyn Object) -> Result<(), StoreError> {
            self.inner.save_raw(object)
        }

        fn assign_related(
            &mut self,
            object: &dyn Object,
            accessor: &str,
            keys: &[Scalar],
        ) -> Result<(), StoreError> {
            if accessor == self.broken && !self.healed {
                return Err(StoreError::Backend(String::from("connection reset")));
            }
            self.inner.assign_related(object, accessor, keys)
        }
    }

    fn article() -> DeserializedObject {
        let meta = ModelMeta::builder("blog", "Article")
            .field(FieldMeta::new("headline", ScalarKind::Str))
            .field(FieldMeta::many_to_many("tags", "blog.tag", ScalarKind::Int))
            .build();
        let mut container =
            DeserializedObject::new(Box::new(DynamicModel::new(meta).with("id", 7).with("headline", "Hi")));
        container.set_m2m("tags", vec![Scalar::Int(1), Scalar::Int(2)]);
        container
    }

    #[test]
    fn second_persist_does_not_reapply_relations() {
        let mut store = MemoryStore::new();
        let mut container = article();
        assert!(container.has_pending_m2m());

        container.persist(&mut store, true).unwrap();
        assert_eq!(store.assignments(), 1);
        assert!(container.m2m_data().is_none());

        container.persist(&mut store, true).unwrap();
        assert_eq!(store.assignments(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.related("blog.article", &Scalar::Int(7), "tags"),
            [Scalar::Int(1), Scalar::Int(2)]
        );
    }

    #[test]
    fn skipping_relations_still_clears_them() {
        let mut store = MemoryStore::new();
        let mut container = article();
        container.persist(&mut store, false).unwrap();
        assert_eq!(store.assignments(), 0);
        assert!(!container.has_pending_m2m());
    }

    #[test]
    fn display_names_model_and_pk() {
        assert_eq!(
            article().to_string(),
            "<DeserializedObject: blog.Article(pk=7)>"
        );
    }

    #[test]
    fn failed_assignment_stays_pending() {
        let mut container = article();
        container.set_m2m("authors", vec![Scalar::Int(9)]);
        container.set_m2m("related", vec![Scalar::Int(3)]);
        let mut store = Flaky {
            inner: MemoryStore::new(),
            broken: "authors",
            healed: false,
        };

        assert!(container.persist(&mut store, true).is_err());
        assert_eq!(store.inner.assignments(), 1);
        let pending = container.m2m_data().unwrap();
        assert_eq!(pending.keys().cloned().collect::<Vec<_>>(), ["authors", "related"]);

        store.healed = true;
        container.persist(&mut store, true).unwrap();
        assert_eq!(store.inner.assignments(), 3);
        assert!(!container.has_pending_m2m());
        assert_eq!(
            store.inner.related("blog.article", &Scalar::Int(7), "authors"),
            [Scalar::Int(9)]
        );
    }
}
