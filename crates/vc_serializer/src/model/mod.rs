//! The object/model collaborator: introspection, construction, persistence.
//!
//! The serializer engine only talks to objects through the traits here.
//! [`DynamicModel`] and [`MemoryStore`] implement them in memory.

mod dynamic;
mod kind;
mod meta;
mod object;
mod registry;
mod store;

pub use dynamic::DynamicModel;
pub use kind::ScalarKind;
pub use meta::{Constructor, FieldMeta, ModelMeta, ModelMetaBuilder, Relation, RelationKind};
pub use object::{Model, Object, Restored, Value};
pub use registry::ModelRegistry;
pub use store::{MemoryStore, NaturalKeyLookup, Row, Store};
