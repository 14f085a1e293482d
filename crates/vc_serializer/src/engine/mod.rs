//! The serializer engine: object serializers and the per-call context.

mod context;
mod deserialize;
mod serialize;

pub use context::Context;
pub use serialize::SerializeIter;

use alloc::string::{String, ToString};

use crate::config::{ConfigPatch, SerializerConfig};
use crate::error::SerializerError;
use crate::field::{DescriptorKind, FieldDescriptor};
use crate::native::Metadata;
use crate::schema::{Schema, SchemaBuilder};

// -----------------------------------------------------------------------------
// ObjectSerializer

/// A schema of fields plus the configuration that drives dynamic fields and
/// object creation.
///
/// Built once with [`ObjectSerializer::builder`], then shared. Per-instance
/// options produce a new serializer through [`configure`](Self::configure);
/// nothing is mutated during a call.
///
/// # Examples
///
/// ```
/// use vc_serializer::field::{FieldDescriptor, PlainField};
/// use vc_serializer::model::{DynamicModel, FieldMeta, ModelMeta, ModelRegistry, ScalarKind};
/// use vc_serializer::{ConfigPatch, Context, ObjectSerializer};
///
/// let meta = ModelMeta::builder("blog", "Article")
///     .field(FieldMeta::new("headline", ScalarKind::Str))
///     .field(FieldMeta::new("body", ScalarKind::Str))
///     .build();
/// let article = DynamicModel::new(meta).with("id", 1).with("headline", "Hi").with("body", "...");
///
/// let serializer = ObjectSerializer::builder("ArticleSerializer")
///     .field("headline", FieldDescriptor::field(PlainField).label("title"))
///     .build()
///     .unwrap()
///     .configure(&ConfigPatch::new().exclude(["body"]));
///
/// let registry = ModelRegistry::new();
/// let node = serializer.serialize(&Context::new(&registry), &article).unwrap();
/// let mapping = node.as_mapping().unwrap();
///
/// assert_eq!(mapping.keys().collect::<Vec<_>>(), ["title"]);
/// assert_eq!(mapping.get("title").unwrap().as_str(), Some("Hi"));
/// ```
#[derive(Debug, Clone)]
pub struct ObjectSerializer {
    name: String,
    schema: Schema,
    meta: ConfigPatch,
    config: SerializerConfig,
    metadata: Metadata,
}

impl ObjectSerializer {
    #[inline]
    pub fn builder(name: &str) -> ObjectSerializerBuilder {
        ObjectSerializerBuilder {
            name: name.to_string(),
            schema: Schema::builder(name),
            inherited_meta: ConfigPatch::new(),
            meta: ConfigPatch::new(),
            inherited_metadata: Metadata::new(),
            metadata: Metadata::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared fields, inherited ones first.
    #[inline]
    pub fn base_fields(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Hints attached to every node this serializer produces.
    #[inline]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns a copy with per-instance options applied over the class-level
    /// configuration.
    pub fn configure(&self, options: &ConfigPatch) -> Self {
        Self {
            config: SerializerConfig::from_patch(&self.meta.merged(options)),
            ..self.clone()
        }
    }

    /// Returns a copy whose nested serializer `field` is configured with
    /// `options`.
    pub fn configure_field(&self, field: &str, options: &ConfigPatch) -> Result<Self, SerializerError> {
        let not_nested = || SerializerError::NotASerializer {
            field: field.to_string(),
        };
        let descriptor = self.schema.get(field).ok_or_else(not_nested)?;
        let DescriptorKind::Serializer(nested) = descriptor.kind() else {
            return Err(not_nested());
        };
        let replaced = descriptor.with_serializer(nested.configure(options));
        Ok(Self {
            schema: self.schema.with_replaced(field, replaced),
            ..self.clone()
        })
    }

    /// Applies this serializer's own options to the call context.
    ///
    /// An explicit `use_natural_keys` overrides the context either way.
    #[inline]
    fn scoped<'c>(&self, cx: &Context<'c>) -> Context<'c> {
        match self.config.use_natural_keys {
            Some(flag) => cx.with_natural_keys(flag),
            None => *cx,
        }
    }
}

// -----------------------------------------------------------------------------
// ObjectSerializerBuilder

/// Declares an [`ObjectSerializer`].
#[derive(Debug)]
pub struct ObjectSerializerBuilder {
    name: String,
    schema: SchemaBuilder,
    inherited_meta: ConfigPatch,
    meta: ConfigPatch,
    inherited_metadata: Metadata,
    metadata: Metadata,
}

impl ObjectSerializerBuilder {
    /// Inherits fields, class-level options and metadata from `base`.
    ///
    /// Several bases may be given; options of later bases win.
    pub fn inherit(mut self, base: &ObjectSerializer) -> Self {
        self.schema = self.schema.inherit(&base.schema);
        self.inherited_meta = self.inherited_meta.merged(&base.meta);
        self.inherited_metadata.extend(&base.metadata);
        self
    }

    /// Declares a field.
    pub fn field(mut self, name: &str, descriptor: FieldDescriptor) -> Self {
        self.schema = self.schema.field(name, descriptor);
        self
    }

    /// Class-level options, layered over inherited ones.
    pub fn meta(mut self, options: ConfigPatch) -> Self {
        self.meta = self.meta.merged(&options);
        self
    }

    /// Hints for produced nodes, layered over inherited ones.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.extend(&metadata);
        self
    }

    /// Shorthand for flagging output entries as attributes in the metadata.
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.metadata.add_attribute(name.as_ref());
        }
        self
    }

    pub fn build(self) -> Result<ObjectSerializer, SerializerError> {
        let meta = self.inherited_meta.merged(&self.meta);
        let mut metadata = self.inherited_metadata;
        metadata.extend(&self.metadata);
        Ok(ObjectSerializer {
            name: self.name,
            schema: self.schema.build()?,
            config: SerializerConfig::from_patch(&meta),
            meta,
            metadata,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::{String, ToString};
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use super::{Context, ObjectSerializer};
    use crate::config::{ClassName, ConfigPatch};
    use crate::error::{DeserializationError, SerializationError, SerializerError};
    use crate::field::{FieldDescriptor, ModelNameField, PlainField, PrimaryKeyField};
    use crate::model::{
        DynamicModel, FieldMeta, MemoryStore, ModelMeta, ModelRegistry, Object, Restored,
        ScalarKind, Value,
    };
    use crate::native::{Native, Scalar};
    use crate::schema::Schema;

    #[derive(Default)]
    struct Point {
        x: i64,
        y: i64,
        secret: String,
    }

    impl Object for Point {
        fn type_name(&self) -> &str {
            "Point"
        }

        fn field_names(&self) -> Vec<String> {
            ["x", "y", "secret"].map(String::from).to_vec()
        }

        fn get(&self, name: &str) -> Option<Value<'_>> {
            let scalar = match name {
                "x" => Scalar::Int(self.x),
                "y" => Scalar::Int(self.y),
                "secret" => Scalar::Str(self.secret.clone()),
                _ => return None,
            };
            Some(Value::Scalar(scalar))
        }

        fn set(&mut self, name: &str, value: Restored) -> Result<(), DeserializationError> {
            let scalar = value.as_scalar().cloned().unwrap_or(Scalar::Null);
            match name {
                "x" => self.x = scalar.as_i64().unwrap_or_default(),
                "y" => self.y = scalar.as_i64().unwrap_or_default(),
                "secret" => self.secret = scalar.as_str().unwrap_or_default().to_string(),
                _ => {}
            }
            Ok(())
        }
    }

    fn point() -> Point {
        Point {
            x: 1,
            y: 2,
            secret: "hunter2".to_string(),
        }
    }

    fn plain() -> FieldDescriptor {
        FieldDescriptor::field(PlainField)
    }

    fn native_of(object: &dyn Object, name: &str) -> Native {
        object.get(name).unwrap().into_native().unwrap()
    }

    fn user_meta() -> Arc<ModelMeta> {
        ModelMeta::builder("auth", "User")
            .field(FieldMeta::new("username", ScalarKind::Str))
            .natural_key(["username"])
            .build()
    }

    fn tag_meta() -> Arc<ModelMeta> {
        ModelMeta::builder("blog", "Tag")
            .field(FieldMeta::new("name", ScalarKind::Str))
            .build()
    }

    fn article_meta() -> Arc<ModelMeta> {
        ModelMeta::builder("blog", "Article")
            .field(FieldMeta::new("headline", ScalarKind::Str))
            .field(FieldMeta::new("pub_date", ScalarKind::Date))
            .field(FieldMeta::foreign_key("author", "auth.User", ScalarKind::Int))
            .field(FieldMeta::many_to_many("tags", "blog.Tag", ScalarKind::Int))
            .build()
    }

    fn registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry.register(user_meta());
        registry.register(tag_meta());
        registry.register(article_meta());
        registry
    }

    /// `{pk, model, fields: {..}}`, the layout of the dump formats.
    fn dump_serializer() -> ObjectSerializer {
        let fields = ObjectSerializer::builder("Fields").build().unwrap();
        ObjectSerializer::builder("Dump")
            .field("pk", FieldDescriptor::field(PrimaryKeyField))
            .field("model", FieldDescriptor::field(ModelNameField))
            .field("fields", FieldDescriptor::serializer(fields).follow_object(false))
            .meta(
                ConfigPatch::new()
                    .fields(core::iter::empty::<&str>())
                    .class_key("model"),
            )
            .build()
            .unwrap()
    }

    fn mapping(entries: &[(&str, Native)]) -> Native {
        Native::Mapping(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone().into()))
                .collect(),
        )
    }

    // -------------------------------------------------------------------------
    // Declaration

    #[test]
    fn inherited_fields_come_first() {
        let base = ObjectSerializer::builder("Base").field("a", plain()).build().unwrap();
        let child = ObjectSerializer::builder("Child")
            .inherit(&base)
            .field("b", plain())
            .field("c", plain())
            .build()
            .unwrap();

        let names: Vec<_> = child.base_fields().names().collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn redeclared_field_keeps_ancestor_position() {
        let base = ObjectSerializer::builder("Base")
            .field("a", plain())
            .field("b", plain())
            .build()
            .unwrap();
        let child = ObjectSerializer::builder("Child")
            .inherit(&base)
            .field("a", plain().label("x"))
            .build()
            .unwrap();

        let names: Vec<_> = child.base_fields().names().collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(child.base_fields().get("a").unwrap().output_key("a"), "x");
    }

    #[test]
    fn attribute_with_subfields_is_rejected() {
        let sub = Schema::builder("Sub").field("a", plain()).build().unwrap();
        let err = ObjectSerializer::builder("Broken")
            .field("item", plain().attribute(true).with_fields(sub))
            .build()
            .unwrap_err();
        assert!(matches!(err, SerializerError::AttributeWithSubfields { field } if field == "item"));
    }

    #[test]
    fn configure_field_requires_a_nested_serializer() {
        let serializer = dump_serializer();
        assert!(serializer.configure_field("fields", &ConfigPatch::new()).is_ok());
        let err = serializer
            .configure_field("pk", &ConfigPatch::new())
            .unwrap_err();
        assert!(matches!(err, SerializerError::NotASerializer { .. }));
    }

    // -------------------------------------------------------------------------
    // Serialize

    #[test]
    fn plain_object_is_introspected_in_order() {
        let registry = ModelRegistry::new();
        let serializer = ObjectSerializer::builder("Points").build().unwrap();
        let node = serializer.serialize(&Context::new(&registry), &point()).unwrap();

        let keys: Vec<_> = node.as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["x", "y", "secret"]);
    }

    #[test]
    fn exclude_drops_dynamic_fields() {
        let registry = ModelRegistry::new();
        let serializer = ObjectSerializer::builder("Points")
            .build()
            .unwrap()
            .configure(&ConfigPatch::new().exclude(["secret"]));
        let node = serializer.serialize(&Context::new(&registry), &point()).unwrap();

        let keys: Vec<_> = node.as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["x", "y"]);
    }

    #[test]
    fn empty_field_list_disables_introspection() {
        let registry = ModelRegistry::new();
        let serializer = ObjectSerializer::builder("Points")
            .build()
            .unwrap()
            .configure(&ConfigPatch::new().fields(core::iter::empty::<&str>()));
        let node = serializer.serialize(&Context::new(&registry), &point()).unwrap();

        assert!(node.as_mapping().unwrap().is_empty());
    }

    #[test]
    fn listed_fields_come_first_in_listed_order() {
        let serializer = ObjectSerializer::builder("Points")
            .field("label", FieldDescriptor::field(PlainField).follow_object(false))
            .build()
            .unwrap()
            .configure(&ConfigPatch::new().fields(["y", "x"]));
        let fields = crate::resolve::fields_for_object(
            serializer.base_fields(),
            serializer.config(),
            &point(),
        )
        .unwrap();

        let names: Vec<_> = fields.names().collect();
        assert_eq!(names, ["y", "x", "label"]);
    }

    #[test]
    fn unknown_listed_field_is_an_error() {
        let registry = ModelRegistry::new();
        let serializer = ObjectSerializer::builder("Points")
            .build()
            .unwrap()
            .configure(&ConfigPatch::new().fields(["z"]));
        let err = serializer.serialize(&Context::new(&registry), &point()).unwrap_err();
        assert!(matches!(err, SerializationError::UnknownField { name } if name == "z"));
    }

    #[test]
    fn scalars_pass_through() {
        let registry = ModelRegistry::new();
        let cx = Context::new(&registry);
        let serializer = ObjectSerializer::builder("Any").build().unwrap();
        for scalar in [
            Scalar::from("Hi"),
            Scalar::Int(3),
            Scalar::Bool(true),
            Scalar::Null,
        ] {
            let node = serializer.serialize_value(&cx, Value::Scalar(scalar.clone())).unwrap();
            assert_eq!(node, Native::Scalar(scalar));
            assert!(node.metadata().is_none());
        }
    }

    #[test]
    fn flattened_subfields_need_a_name() {
        let registry = ModelRegistry::new();
        let sub = Schema::builder("Sub").field("x", plain()).build().unwrap();
        let serializer = ObjectSerializer::builder("Broken")
            .field("inner", plain().follow_object(false).with_fields(sub))
            .meta(ConfigPatch::new().fields(core::iter::empty::<&str>()))
            .build()
            .unwrap();
        let err = serializer.serialize(&Context::new(&registry), &point()).unwrap_err();
        assert!(matches!(err, SerializationError::UnresolvedFlatten { .. }));
    }

    #[test]
    fn m2m_through_custom_table_is_restricted() {
        let meta = ModelMeta::builder("blog", "Entry")
            .field(FieldMeta::many_to_many("tags", "blog.Tag", ScalarKind::Int).with_through())
            .build();
        let registry = ModelRegistry::new();
        let serializer = ObjectSerializer::builder("Entries").build().unwrap();
        let err = serializer
            .serialize(&Context::new(&registry), &DynamicModel::new(meta).with("id", 1))
            .unwrap_err();
        assert!(matches!(err, SerializationError::Restricted { field, .. } if field == "tags"));
    }

    #[test]
    fn serialize_iter_is_lazy() {
        let registry = ModelRegistry::new();
        let serializer = ObjectSerializer::builder("Points").build().unwrap();
        let points = [point(), point()];
        let cx = Context::new(&registry);
        let mut stream = serializer.serialize_iter(&cx, points.iter().map(|p| p as &dyn Object));

        assert_eq!(stream.size_hint(), (2, Some(2)));
        assert!(stream.next().unwrap().is_ok());
        assert_eq!(stream.size_hint(), (1, Some(1)));
    }

    // -------------------------------------------------------------------------
    // Deserialize

    #[test]
    fn label_maps_back_to_attribute() {
        let meta = article_meta();
        let registry = registry();
        let cx = Context::new(&registry);
        let serializer = ObjectSerializer::builder("Articles")
            .field("headline", FieldDescriptor::field(PlainField).label("title"))
            .meta(ConfigPatch::new().fields(["headline"]).model(Arc::clone(&meta)))
            .build()
            .unwrap();

        let article = DynamicModel::new(meta).with("id", 1).with("headline", "Hi");
        let node = serializer.serialize(&cx, &article).unwrap();
        assert_eq!(node.as_mapping().unwrap().get("title").unwrap().as_str(), Some("Hi"));

        let restored = serializer
            .deserialize(&cx, &mapping(&[("title", Native::from("Bye"))]))
            .unwrap();
        assert_eq!(native_of(restored.object(), "headline"), Native::from("Bye"));
    }

    #[test]
    fn factory_builds_plain_objects() {
        let registry = ModelRegistry::new();
        let serializer = ObjectSerializer::builder("Points")
            .meta(ConfigPatch::new().class_name(ClassName::Factory(Arc::new(|| {
                Box::new(Point::default()) as Box<dyn Object>
            }))))
            .build()
            .unwrap();

        let node = mapping(&[("x", Native::from(5i64)), ("y", Native::from(6i64))]);
        let restored = serializer.deserialize(&Context::new(&registry), &node).unwrap();
        assert_eq!(native_of(restored.object(), "x"), Native::from(5i64));
        assert_eq!(native_of(restored.object(), "y"), Native::from(6i64));
    }

    #[test]
    fn deserialize_many_accepts_one_mapping() {
        let registry = ModelRegistry::new();
        let serializer = ObjectSerializer::builder("Points")
            .meta(ConfigPatch::new().class_name(ClassName::Factory(Arc::new(|| {
                Box::new(Point::default()) as Box<dyn Object>
            }))))
            .build()
            .unwrap();
        let cx = Context::new(&registry);

        let one = mapping(&[("x", Native::from(5i64))]);
        assert_eq!(serializer.deserialize_many(&cx, &one).unwrap().len(), 1);

        let many = Native::Sequence(alloc::vec![one.clone().into(), one.into()]);
        assert_eq!(serializer.deserialize_many(&cx, &many).unwrap().len(), 2);

        assert!(serializer.deserialize_many(&cx, &Native::from(1i64)).is_err());
    }

    #[test]
    fn missing_class_name_is_an_error() {
        let registry = ModelRegistry::new();
        let serializer = ObjectSerializer::builder("Points").build().unwrap();
        let err = serializer
            .deserialize(&Context::new(&registry), &mapping(&[]))
            .unwrap_err();
        assert!(matches!(err, DeserializationError::UnresolvedClass));
    }

    #[test]
    fn dump_layout_round_trips() {
        let registry = registry();
        let cx = Context::new(&registry);
        let serializer = dump_serializer();
        let date = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        let article = DynamicModel::new(article_meta())
            .with("id", 7)
            .with("headline", "Hi")
            .with("pub_date", date)
            .with("author_id", 3);
        let node = serializer.serialize(&cx, &article).unwrap();
        let map = node.as_mapping().unwrap();
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["pk", "model", "fields"]);
        assert_eq!(*map.get("pk").unwrap(), Native::from(7i64));
        assert_eq!(map.get("model").unwrap().as_str(), Some("blog.article"));

        let fields = map.get("fields").unwrap().as_mapping().unwrap();
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["headline", "pub_date", "author", "tags"]);
        assert_eq!(*fields.get("author").unwrap(), Native::from(3i64));

        let input = mapping(&[
            ("pk", Native::from("7")),
            ("model", Native::from("blog.article")),
            (
                "fields",
                mapping(&[
                    ("headline", Native::from("Hi")),
                    ("pub_date", Native::from("2020-01-01")),
                ]),
            ),
        ]);
        let restored = serializer.deserialize(&cx, &input).unwrap();
        let object = restored.object();
        assert_eq!(object.as_model().unwrap().pk(), Scalar::Int(7));
        assert_eq!(native_of(object, "pub_date"), Native::from(date));
        assert_eq!(restored.to_string(), "<DeserializedObject: blog.Article(pk=7)>");
    }

    #[test]
    fn unknown_model_identifier_is_an_error() {
        let registry = registry();
        let input = mapping(&[("pk", Native::from(1i64)), ("model", Native::from("blog.nothing"))]);
        let err = dump_serializer()
            .deserialize(&Context::new(&registry), &input)
            .unwrap_err();
        assert!(matches!(err, DeserializationError::InvalidModelIdentifier(_)));

        let err = dump_serializer()
            .deserialize(&Context::new(&registry), &mapping(&[("pk", Native::from(1i64))]))
            .unwrap_err();
        assert!(matches!(err, DeserializationError::MissingClassKey { key } if key == "model"));
    }

    #[test]
    fn m2m_is_queued_until_persist() {
        let registry = registry();
        let input = mapping(&[
            ("pk", Native::from(1i64)),
            ("model", Native::from("blog.article")),
            (
                "fields",
                mapping(&[(
                    "tags",
                    Native::Sequence(alloc::vec![Native::from(1i64).into(), Native::from("2").into()]),
                )]),
            ),
        ]);
        let mut restored = dump_serializer()
            .deserialize(&Context::new(&registry), &input)
            .unwrap();
        assert!(restored.has_pending_m2m());

        let mut store = MemoryStore::new();
        restored.persist(&mut store, true).unwrap();
        assert_eq!(
            store.related("blog.article", &Scalar::Int(1), "tags"),
            [Scalar::Int(1), Scalar::Int(2)]
        );
        assert!(!restored.has_pending_m2m());
    }

    #[test]
    fn m2m_members_serialize_as_keys() {
        let registry = registry();
        let article = DynamicModel::new(article_meta())
            .with("id", 1)
            .with_many("tags", DynamicModel::new(tag_meta()).with("id", 4))
            .with_many("tags", DynamicModel::new(tag_meta()).with("id", 5));
        let node = dump_serializer()
            .configure_field("fields", &ConfigPatch::new().fields(["tags"]))
            .unwrap()
            .serialize(&Context::new(&registry), &article)
            .unwrap();

        let fields = node.as_mapping().unwrap().get("fields").unwrap();
        let tags = fields.as_mapping().unwrap().get("tags").unwrap();
        let keys: Vec<_> = tags.as_sequence().unwrap().iter().map(|n| n.value.clone()).collect();
        assert_eq!(keys, [Native::from(4i64), Native::from(5i64)]);
        assert_eq!(tags.metadata().unwrap().item_name(), Some("object"));
    }

    #[test]
    fn natural_keys_resolve_through_lookup() {
        let registry = registry();
        let user = DynamicModel::new(user_meta()).with("id", 3).with("username", "alice");
        let article = DynamicModel::new(article_meta())
            .with("id", 1)
            .with_related("author", user.clone());

        let serializer = dump_serializer()
            .configure_field("fields", &ConfigPatch::new().fields(["author"]))
            .unwrap();
        let cx = Context::new(&registry).with_natural_keys(true);
        let node = serializer.serialize(&cx, &article).unwrap().stripped();
        let fields = node.as_mapping().unwrap().get("fields").unwrap();
        let author = fields.as_mapping().unwrap().get("author").unwrap();
        assert_eq!(
            author.as_sequence().unwrap().iter().map(|n| n.value.clone()).collect::<Vec<_>>(),
            [Native::from("alice")]
        );

        let err = serializer.deserialize(&Context::new(&registry), &node).unwrap_err();
        assert!(matches!(err, DeserializationError::NoLookup { model } if model == "auth.user"));

        let mut store = MemoryStore::new();
        store.insert(&user);
        let restored = serializer
            .deserialize(&Context::new(&registry).with_lookup(&store), &node)
            .unwrap();
        assert_eq!(native_of(restored.object(), "author_id"), Native::from(3i64));
    }

    #[test]
    fn serializer_can_turn_natural_keys_off() {
        let registry = registry();
        let user = DynamicModel::new(user_meta()).with("id", 3).with("username", "alice");
        let article = DynamicModel::new(article_meta())
            .with("id", 1)
            .with_related("author", user);

        let options = ConfigPatch::new().fields(["author"]).use_natural_keys(false);
        let serializer = dump_serializer().configure_field("fields", &options).unwrap();
        let cx = Context::new(&registry).with_natural_keys(true);
        let node = serializer.serialize(&cx, &article).unwrap().stripped();
        let fields = node.as_mapping().unwrap().get("fields").unwrap();
        assert_eq!(fields.as_mapping().unwrap().get("author").unwrap(), &Native::from(3i64));
    }
}
