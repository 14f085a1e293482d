use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use std::io;

use log::debug;
use vc_serializer::model::Object;
use vc_serializer::native::{Native, Node};
use vc_serializer::{
    ConfigPatch, Context, DeserializationError, DeserializedObject, Error, ObjectSerializer,
    SerializationError, SerializerDoesNotExist, SerializerError,
};
use vc_utils::OrderedMap;

use crate::dump;

/// A stream of serialized top-level objects.
///
/// See [`ObjectSerializer::serialize_iter`].
pub type NodeStream<'a> = dyn Iterator<Item = Result<Node, SerializationError>> + 'a;

// -----------------------------------------------------------------------------
// Format

/// A named wire format: the serializer laying objects out, plus the
/// renderer and parser for the native tree.
pub trait Format: Send + Sync + 'static {
    /// The registry key, e.g. `"json"`.
    fn name(&self) -> &str;

    /// Formats flagged here are left out of [`FormatRegistry::public_names`].
    fn internal_use_only(&self) -> bool {
        false
    }

    /// The serializer for this format, with `options` applied to the
    /// per-object field set.
    fn serializer(&self, options: &ConfigPatch) -> Result<ObjectSerializer, SerializerError> {
        dump::serializer()?.configure_field(dump::FIELDS, options)
    }

    /// Writes every node of `nodes` to `out`, pulling them one at a time.
    fn render(
        &self,
        nodes: &mut NodeStream<'_>,
        out: &mut dyn io::Write,
    ) -> Result<(), SerializationError>;

    /// Parses a whole document into a sequence of object trees.
    fn parse(&self, input: &[u8]) -> Result<Native, DeserializationError>;
}

pub(crate) fn render_error(format: &str, reason: impl fmt::Display) -> SerializationError {
    SerializationError::Render {
        format: format.to_string(),
        reason: reason.to_string(),
    }
}

pub(crate) fn parse_error(format: &str, reason: impl fmt::Display) -> DeserializationError {
    DeserializationError::Format {
        format: format.to_string(),
        reason: reason.to_string(),
    }
}

// -----------------------------------------------------------------------------
// FormatRegistry

/// Formats by name.
///
/// # Examples
///
/// ```
/// use vc_format::FormatRegistry;
///
/// let registry = FormatRegistry::new();
/// assert!(registry.get("json").is_ok());
/// assert!(registry.get("toml").is_err());
/// ```
pub struct FormatRegistry {
    formats: OrderedMap<String, Arc<dyn Format>>,
}

impl Default for FormatRegistry {
    /// See [`FormatRegistry::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.formats.keys()).finish()
    }
}

impl FormatRegistry {
    /// Creates a registry without any format.
    #[inline]
    pub fn empty() -> Self {
        Self {
            formats: OrderedMap::new(),
        }
    }

    /// Creates a registry with the built-in formats enabled by cargo features.
    pub fn new() -> Self {
        #[cfg_attr(
            not(any(feature = "json", feature = "yaml", feature = "xml")),
            expect(unused_mut, reason = "no built-in format enabled")
        )]
        let mut registry = Self::empty();
        #[cfg(feature = "json")]
        registry.register(crate::json::JsonFormat::new());
        #[cfg(feature = "yaml")]
        registry.register(crate::yaml::YamlFormat);
        #[cfg(feature = "xml")]
        registry.register(crate::xml::XmlFormat::new());
        registry
    }

    /// Registers `format` under its name, replacing any format of that name.
    pub fn register(&mut self, format: impl Format) {
        let name = format.name().to_string();
        if self.formats.contains_key(name.as_str()) {
            debug!("format `{name}` was registered twice, keeping the latest");
        }
        self.formats.insert(name, Arc::new(format));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Format, SerializerDoesNotExist> {
        match self.formats.get(name) {
            Some(format) => Ok(&**format),
            None => Err(SerializerDoesNotExist {
                format: name.to_string(),
            }),
        }
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// Names of all registered formats, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    /// Names of the formats meant for end users.
    pub fn public_names(&self) -> impl Iterator<Item = &str> {
        self.formats
            .iter()
            .filter(|(_, format)| !format.internal_use_only())
            .map(|(name, _)| name.as_str())
    }

    // -------------------------------------------------------------------------
    // Entry points

    /// Serializes `objects` in format `name` into `out`.
    ///
    /// Objects are serialized one at a time as the renderer pulls them.
    pub fn serialize<'o, I>(
        &self,
        name: &str,
        cx: &Context<'_>,
        objects: I,
        options: &ConfigPatch,
        out: &mut dyn io::Write,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = &'o dyn Object>,
    {
        let format = self.get(name)?;
        debug!("serializing as `{name}`");
        let serializer = format.serializer(options)?;
        let mut nodes = serializer.serialize_iter(cx, objects);
        format.render(&mut nodes, out)?;
        Ok(())
    }

    /// Like [`serialize`](Self::serialize), collecting the output in a string.
    pub fn serialize_to_string<'o, I>(
        &self,
        name: &str,
        cx: &Context<'_>,
        objects: I,
        options: &ConfigPatch,
    ) -> Result<String, Error>
    where
        I: IntoIterator<Item = &'o dyn Object>,
    {
        let mut out = Vec::new();
        self.serialize(name, cx, objects, options, &mut out)?;
        String::from_utf8(out).map_err(|e| Error::from(render_error(name, e)))
    }

    /// Parses `input` in format `name` and rebuilds every object in it.
    ///
    /// Nothing is persisted; see [`DeserializedObject::persist`].
    pub fn deserialize(
        &self,
        name: &str,
        cx: &Context<'_>,
        input: &[u8],
        options: &ConfigPatch,
    ) -> Result<Vec<DeserializedObject>, Error> {
        let format = self.get(name)?;
        debug!("deserializing `{name}` input of {} bytes", input.len());
        let tree = format.parse(input)?;
        let serializer = format.serializer(options)?;
        Ok(serializer.deserialize_many(cx, &tree)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{Format, FormatRegistry, NodeStream};
    use alloc::string::ToString;
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use std::io;
    use vc_serializer::model::{
        DynamicModel, FieldMeta, MemoryStore, ModelMeta, ModelRegistry, Object, ScalarKind,
    };
    use vc_serializer::native::{Native, Node, Scalar};
    use vc_serializer::{ConfigPatch, Context, DeserializationError, Error, SerializationError};

    struct Silent;

    impl Format for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn internal_use_only(&self) -> bool {
            true
        }

        fn render(
            &self,
            nodes: &mut NodeStream<'_>,
            _out: &mut dyn io::Write,
        ) -> Result<(), SerializationError> {
            for node in nodes {
                node?;
            }
            Ok(())
        }

        fn parse(&self, _input: &[u8]) -> Result<Native, DeserializationError> {
            Ok(Native::Sequence(Default::default()))
        }
    }

    #[test]
    fn unknown_format_is_reported_by_name() {
        let err = FormatRegistry::empty().get("json").err().unwrap();
        assert_eq!(err.format, "json");
    }

    #[test]
    fn internal_formats_are_not_public() {
        let mut registry = FormatRegistry::empty();
        registry.register(Silent);
        assert!(registry.contains("silent"));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["silent"]);
        assert_eq!(registry.public_names().count(), 0);
    }

    #[cfg(all(feature = "json", feature = "yaml", feature = "xml"))]
    #[test]
    fn builtins_are_registered_in_order() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.public_names().collect::<Vec<_>>(), ["json", "yaml", "xml"]);
    }

    // -------------------------------------------------------------------------
    // Round trips

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

    fn models() -> ModelRegistry {
        let mut models = ModelRegistry::new();
        models.register(user_meta());
        models.register(tag_meta());
        models.register(article_meta());
        models
    }

    fn alice() -> DynamicModel {
        DynamicModel::new(user_meta()).with("id", 3).with("username", "alice")
    }

    fn article() -> DynamicModel {
        let date = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        DynamicModel::new(article_meta())
            .with("id", 7)
            .with("headline", "Hi")
            .with("pub_date", date)
            .with_related("author", alice())
            .with_many("tags", DynamicModel::new(tag_meta()).with("id", 1))
            .with_many("tags", DynamicModel::new(tag_meta()).with("id", 2))
    }

    fn field(object: &dyn Object, name: &str) -> Native {
        object.get(name).unwrap().into_native().unwrap()
    }

    fn only<'a>(object: &'a DynamicModel) -> [&'a dyn Object; 1] {
        [object as &dyn Object]
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_matches_native_tree() {
        let models = models();
        let cx = Context::new(&models);
        let registry = FormatRegistry::new();
        let options = ConfigPatch::new().fields(["headline", "pub_date"]);
        let article = DynamicModel::new(article_meta())
            .with("id", 7)
            .with("headline", "Hi")
            .with("pub_date", "2020-01-01");

        let json = registry
            .serialize_to_string("json", &cx, only(&article), &options)
            .unwrap();
        assert_eq!(
            json,
            r#"[{"pk":7,"model":"blog.article","fields":{"headline":"Hi","pub_date":"2020-01-01"}}]"#
        );

        let format = registry.get("json").unwrap();
        let tree = format
            .serializer(&options)
            .unwrap()
            .serialize(&cx, &article)
            .unwrap()
            .stripped();
        let parsed = format.parse(json.as_bytes()).unwrap();
        assert_eq!(parsed, Native::Sequence(Vec::from([Node::from(tree)])));
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_round_trip_restores_fields_and_relations() {
        let models = models();
        let cx = Context::new(&models);
        let registry = FormatRegistry::new();
        let article = article();

        let json = registry
            .serialize_to_string("json", &cx, only(&article), &ConfigPatch::new())
            .unwrap();
        let mut restored = registry
            .deserialize("json", &cx, json.as_bytes(), &ConfigPatch::new())
            .unwrap();
        assert_eq!(restored.len(), 1);

        let object = restored[0].object();
        assert_eq!(object.as_model().unwrap().pk(), Scalar::Int(7));
        assert_eq!(field(object, "headline"), Native::from("Hi"));
        assert_eq!(field(object, "pub_date"), field(&article, "pub_date"));
        assert_eq!(field(object, "author_id"), Native::from(3i64));

        let mut store = MemoryStore::new();
        restored[0].persist(&mut store, true).unwrap();
        assert_eq!(
            store.related("blog.article", &Scalar::Int(7), "tags"),
            [Scalar::Int(1), Scalar::Int(2)]
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_natural_keys_need_a_lookup() {
        let models = models();
        let registry = FormatRegistry::new();
        let article = article();
        let options = ConfigPatch::new().fields(["author"]).use_natural_keys(true);

        let json = registry
            .serialize_to_string("json", &Context::new(&models), only(&article), &options)
            .unwrap();
        assert!(json.contains(r#""author":["alice"]"#), "{json}");

        let mut store = MemoryStore::new();
        store.insert(&alice());
        let cx = Context::new(&models).with_lookup(&store);
        let restored = registry
            .deserialize("json", &cx, json.as_bytes(), &options)
            .unwrap();
        assert_eq!(field(restored[0].object(), "author_id"), Native::from(3i64));
    }

    #[cfg(feature = "json")]
    #[test]
    fn failures_keep_their_kind() {
        let models = models();
        let cx = Context::new(&models);
        let registry = FormatRegistry::new();

        let err = registry
            .deserialize("json", &cx, b"[{", &ConfigPatch::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization(DeserializationError::Format { ref format, .. }) if format == "json"
        ));

        let err = registry
            .serialize_to_string("toml", &cx, only(&article()), &ConfigPatch::new())
            .unwrap_err();
        assert!(matches!(err, Error::DoesNotExist(_)));

        let err = registry
            .serialize_to_string("json", &cx, only(&article()), &ConfigPatch::new().fields(["nope"]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Serialization(SerializationError::UnknownField { .. })
        ));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_round_trip() {
        let models = models();
        let cx = Context::new(&models);
        let registry = FormatRegistry::new();
        let article = article();

        let yaml = registry
            .serialize_to_string("yaml", &cx, only(&article), &ConfigPatch::new())
            .unwrap();
        assert!(yaml.contains("model: blog.article"), "{yaml}");

        let restored = registry
            .deserialize("yaml", &cx, yaml.as_bytes(), &ConfigPatch::new())
            .unwrap();
        let object = restored[0].object();
        assert_eq!(object.as_model().unwrap().pk(), Scalar::Int(7));
        assert_eq!(field(object, "pub_date"), field(&article, "pub_date"));
        assert!(restored[0].has_pending_m2m());
    }

    #[cfg(feature = "xml")]
    #[test]
    fn xml_describes_fields_with_attributes() {
        let models = models();
        let cx = Context::new(&models);
        let mut registry = FormatRegistry::empty();
        registry.register(crate::xml::XmlFormat::compact());
        let options = ConfigPatch::new().fields(["headline", "author"]);

        let xml = registry
            .serialize_to_string("xml", &cx, only(&article()), &options)
            .unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <objects version=\"1.0\">\
             <object pk=\"7\" model=\"blog.article\"><fields>\
             <headline type=\"CharField\">Hi</headline>\
             <author rel=\"ManyToOneRel\" to=\"auth.user\">3</author>\
             </fields></object>\
             </objects>\n"
        );
    }

    #[cfg(feature = "xml")]
    #[test]
    fn xml_round_trip() {
        let models = models();
        let cx = Context::new(&models);
        let registry = FormatRegistry::new();
        let article = article();

        let xml = registry
            .serialize_to_string("xml", &cx, only(&article), &ConfigPatch::new())
            .unwrap();
        let restored = registry
            .deserialize("xml", &cx, xml.as_bytes(), &ConfigPatch::new())
            .unwrap();

        let object = restored[0].object();
        assert_eq!(object.as_model().unwrap().pk(), Scalar::Int(7));
        assert_eq!(field(object, "headline"), Native::from("Hi"));
        assert_eq!(field(object, "pub_date"), field(&article, "pub_date"));
        assert_eq!(field(object, "author_id"), Native::from(3i64));

        let pending = restored[0].m2m_data().unwrap();
        assert_eq!(pending.get("tags").unwrap(), &[Scalar::Int(1), Scalar::Int(2)]);
        assert_eq!(restored[0].to_string(), "<DeserializedObject: blog.Article(pk=7)>");
    }

    #[cfg(feature = "xml")]
    #[test]
    fn xml_keeps_padded_strings() {
        let models = models();
        let cx = Context::new(&models);
        let registry = FormatRegistry::new();

        for headline in ["  Hi  ", "   ", "\tline\n"] {
            let article = article().with("headline", headline);
            let xml = registry
                .serialize_to_string("xml", &cx, only(&article), &ConfigPatch::new())
                .unwrap();
            let restored = registry
                .deserialize("xml", &cx, xml.as_bytes(), &ConfigPatch::new())
                .unwrap();
            assert_eq!(field(restored[0].object(), "headline"), Native::from(headline));
        }
    }
}
