use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use super::{DynamicModel, Object, ScalarKind};

// -----------------------------------------------------------------------------
// Relation

/// How a relation field connects two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    ManyToOne,
    OneToOne,
    ManyToMany,
}

impl RelationKind {
    /// The relation descriptor name, as printed by attribute-aware renderers.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ManyToOne => "ManyToOneRel",
            Self::OneToOne => "OneToOneRel",
            Self::ManyToMany => "ManyToManyRel",
        }
    }

    const fn internal_type(self) -> &'static str {
        match self {
            Self::ManyToOne => "ForeignKey",
            Self::OneToOne => "OneToOneField",
            Self::ManyToMany => "ManyToManyField",
        }
    }
}

/// The target of a relation field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    /// Label of the related model, `app_label.model_name`.
    pub to: String,
    /// Whether the intermediate table of a many-to-many relation is
    /// generated rather than declared by hand.
    pub auto_created: bool,
}

// -----------------------------------------------------------------------------
// FieldMeta

/// Introspection data for one model field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    name: String,
    attname: String,
    kind: ScalarKind,
    relation: Option<Relation>,
    serialize: bool,
    internal_type: Option<String>,
}

impl FieldMeta {
    /// A plain value field.
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        let name = name.into();
        Self {
            attname: name.clone(),
            name,
            kind,
            relation: None,
            serialize: true,
            internal_type: None,
        }
    }

    /// An auto-incrementing integer primary key. Not serialized as a field.
    pub fn auto(name: impl Into<String>) -> Self {
        Self::new(name, ScalarKind::Int)
            .serialize(false)
            .internal_type("AutoField")
    }

    /// A foreign key to `to`, whose primary key has the given kind.
    ///
    /// The raw key is stored under `<name>_id`.
    pub fn foreign_key(name: impl Into<String>, to: &str, kind: ScalarKind) -> Self {
        Self::related(name, to, kind, RelationKind::ManyToOne)
    }

    /// A one-to-one link to `to`, stored like a foreign key.
    pub fn one_to_one(name: impl Into<String>, to: &str, kind: ScalarKind) -> Self {
        Self::related(name, to, kind, RelationKind::OneToOne)
    }

    /// A many-to-many relation to `to` through a generated table.
    pub fn many_to_many(name: impl Into<String>, to: &str, kind: ScalarKind) -> Self {
        let mut field = Self::new(name, kind);
        field.relation = Some(Relation {
            kind: RelationKind::ManyToMany,
            to: to.to_lowercase(),
            auto_created: true,
        });
        field
    }

    fn related(name: impl Into<String>, to: &str, kind: ScalarKind, rel: RelationKind) -> Self {
        let mut field = Self::new(name, kind);
        field.attname = format!("{}_id", field.name);
        field.relation = Some(Relation {
            kind: rel,
            to: to.to_lowercase(),
            auto_created: false,
        });
        field
    }

    /// Marks a many-to-many relation as going through a hand-declared table.
    pub fn with_through(mut self) -> Self {
        if let Some(rel) = &mut self.relation {
            rel.auto_created = false;
        }
        self
    }

    /// Whether the field takes part in dynamic field introspection.
    pub fn serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }

    /// Overrides the reported internal type name.
    pub fn internal_type(mut self, name: &str) -> Self {
        self.internal_type = Some(name.to_string());
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name the raw value is stored under.
    #[inline]
    pub fn attname(&self) -> &str {
        &self.attname
    }

    #[inline]
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    #[inline]
    pub fn relation(&self) -> Option<&Relation> {
        self.relation.as_ref()
    }

    #[inline]
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    #[inline]
    pub fn is_many_to_many(&self) -> bool {
        matches!(&self.relation, Some(r) if r.kind == RelationKind::ManyToMany)
    }

    #[inline]
    pub fn is_serialized(&self) -> bool {
        self.serialize
    }

    pub fn get_internal_type(&self) -> &str {
        match (&self.internal_type, &self.relation) {
            (Some(name), _) => name,
            (None, Some(rel)) => rel.kind.internal_type(),
            (None, None) => self.kind.internal_type(),
        }
    }
}

// -----------------------------------------------------------------------------
// ModelMeta

/// Builds a blank instance of a model.
pub type Constructor = fn(&Arc<ModelMeta>) -> Box<dyn Object>;

/// Introspection data for one model class.
///
/// # Examples
///
/// ```
/// use vc_serializer::model::{FieldMeta, ModelMeta, ScalarKind};
///
/// let meta = ModelMeta::builder("blog", "Article")
///     .field(FieldMeta::new("headline", ScalarKind::Str))
///     .field(FieldMeta::foreign_key("author", "blog.author", ScalarKind::Int))
///     .build();
///
/// assert_eq!(meta.label(), "blog.article");
/// assert_eq!(meta.pk().name(), "id");
/// assert_eq!(meta.field("author").unwrap().attname(), "author_id");
/// ```
#[derive(Debug)]
pub struct ModelMeta {
    app_label: String,
    object_name: String,
    label: String,
    fields: Vec<FieldMeta>,
    natural_key: Option<Vec<String>>,
    constructor: Option<Constructor>,
}

impl ModelMeta {
    #[inline]
    pub fn builder(app_label: &str, object_name: &str) -> ModelMetaBuilder {
        ModelMetaBuilder {
            app_label: app_label.to_string(),
            object_name: object_name.to_string(),
            pk: None,
            fields: Vec::new(),
            natural_key: None,
            constructor: None,
        }
    }

    #[inline]
    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    /// The class name as declared, e.g. `Article`.
    #[inline]
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// `app_label.model_name`, lowercase.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The primary key field. Always the first field.
    #[inline]
    pub fn pk(&self) -> &FieldMeta {
        &self.fields[0]
    }

    /// All fields, primary key first, in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Looks a field up by name, falling back to its attname.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.attname == name))
    }

    /// Fields forming the natural key, if the model has one.
    #[inline]
    pub fn natural_key(&self) -> Option<&[String]> {
        self.natural_key.as_deref()
    }

    #[inline]
    pub fn has_natural_key(&self) -> bool {
        self.natural_key.is_some()
    }

    /// Creates a blank instance.
    ///
    /// Uses the registered constructor, or a [`DynamicModel`] otherwise.
    pub fn instantiate(self: &Arc<Self>) -> Box<dyn Object> {
        match self.constructor {
            Some(ctor) => ctor(self),
            None => Box::new(DynamicModel::new(Arc::clone(self))),
        }
    }
}

/// Builder of [`ModelMeta`].
#[derive(Debug)]
pub struct ModelMetaBuilder {
    app_label: String,
    object_name: String,
    pk: Option<FieldMeta>,
    fields: Vec<FieldMeta>,
    natural_key: Option<Vec<String>>,
    constructor: Option<Constructor>,
}

impl ModelMetaBuilder {
    /// Sets the primary key. Defaults to an auto field called `id`.
    pub fn pk(mut self, field: FieldMeta) -> Self {
        self.pk = Some(field);
        self
    }

    pub fn field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares the fields whose values form the natural key.
    pub fn natural_key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.natural_key = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn constructor(mut self, ctor: Constructor) -> Self {
        self.constructor = Some(ctor);
        self
    }

    pub fn build(self) -> Arc<ModelMeta> {
        let pk = self.pk.unwrap_or_else(|| FieldMeta::auto("id"));
        let mut fields = Vec::with_capacity(self.fields.len() + 1);
        fields.push(pk);
        fields.extend(self.fields);
        Arc::new(ModelMeta {
            label: format!("{}.{}", self.app_label, self.object_name).to_lowercase(),
            app_label: self.app_label,
            object_name: self.object_name,
            fields,
            natural_key: self.natural_key,
            constructor: self.constructor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldMeta, ModelMeta, RelationKind};
    use crate::model::ScalarKind;
    use alloc::string::ToString;

    #[test]
    fn relation_names() {
        let fk = FieldMeta::foreign_key("author", "Blog.Author", ScalarKind::Int);
        assert_eq!(fk.get_internal_type(), "ForeignKey");
        assert_eq!(fk.relation().unwrap().to, "blog.author");
        assert_eq!(fk.relation().unwrap().kind.name(), "ManyToOneRel");

        let m2m = FieldMeta::many_to_many("tags", "blog.tag", ScalarKind::Int);
        assert!(m2m.is_many_to_many());
        assert_eq!(m2m.attname(), "tags");
        assert!(m2m.relation().unwrap().auto_created);
        assert!(!m2m.with_through().relation().unwrap().auto_created);
        assert_eq!(RelationKind::OneToOne.name(), "OneToOneRel");
    }

    #[test]
    fn pk_is_first_and_hidden() {
        let meta = ModelMeta::builder("blog", "Tag")
            .field(FieldMeta::new("name", ScalarKind::Str))
            .natural_key(["name"])
            .build();
        assert_eq!(meta.fields().len(), 2);
        assert_eq!(meta.pk().get_internal_type(), "AutoField");
        assert!(!meta.pk().is_serialized());
        assert_eq!(meta.natural_key(), Some(&["name".to_string()][..]));
    }
}
