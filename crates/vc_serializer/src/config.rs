//! Serializer configuration, merged from layered patches.
//!
//! Precedence, lowest first: defaults, inherited `Meta`, the serializer's own
//! `Meta`, then per-instance options given to
//! [`ObjectSerializer::configure`](crate::ObjectSerializer::configure).

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::field::FieldDescriptor;
use crate::model::{ModelMeta, Object};

/// Builds the descriptor of a dynamically introspected field.
pub type FieldFactory = Arc<dyn Fn() -> FieldDescriptor + Send + Sync>;

/// Builds a blank target object for deserialization.
pub type ObjectFactory = Arc<dyn Fn() -> Box<dyn Object> + Send + Sync>;

// -----------------------------------------------------------------------------
// ClassName

/// How deserialization finds the class of the object to create.
#[derive(Clone)]
pub enum ClassName {
    /// Read a model identifier from this key of the input mapping.
    Key(String),
    /// Always instantiate this model.
    Model(Arc<ModelMeta>),
    /// Always call this factory.
    Factory(ObjectFactory),
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Self::Model(meta) => f.debug_tuple("Model").field(&meta.label()).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

// -----------------------------------------------------------------------------
// SerializerConfig

/// The effective, immutable configuration of an object serializer.
#[derive(Clone, Default)]
pub struct SerializerConfig {
    /// `None` introspects every field; `Some([])` introspects none.
    pub fields: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub class_name: Option<ClassName>,
    pub field_serializer: Option<FieldFactory>,
    pub related_serializer: Option<FieldFactory>,
    pub m2m_serializer: Option<FieldFactory>,
    /// `None` leaves the choice to the call context.
    pub use_natural_keys: Option<bool>,
}

impl SerializerConfig {
    /// Applies a patch over the defaults.
    pub fn from_patch(patch: &ConfigPatch) -> Self {
        let mut config = Self::default();
        config.apply(patch);
        config
    }

    fn apply(&mut self, patch: &ConfigPatch) {
        macro_rules! take {
            ($($name:ident),*) => {
                $(
                    if let Some(value) = &patch.$name {
                        self.$name = Some(value.clone());
                    }
                )*
            };
        }
        take!(fields, exclude, class_name, field_serializer, related_serializer, m2m_serializer);
        if patch.use_natural_keys.is_some() {
            self.use_natural_keys = patch.use_natural_keys;
        }
    }

    /// Returns `true` if no dynamic field can ever be produced.
    #[inline]
    pub fn introspects_nothing(&self) -> bool {
        matches!(&self.fields, Some(names) if names.is_empty())
    }

    #[inline]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == name))
    }
}

impl fmt::Debug for SerializerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerConfig")
            .field("fields", &self.fields)
            .field("exclude", &self.exclude)
            .field("class_name", &self.class_name)
            .field("field_serializer", &self.field_serializer.is_some())
            .field("related_serializer", &self.related_serializer.is_some())
            .field("m2m_serializer", &self.m2m_serializer.is_some())
            .field("use_natural_keys", &self.use_natural_keys)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ConfigPatch

/// One layer of configuration; unset options defer to lower layers.
///
/// # Examples
///
/// ```
/// use vc_serializer::{ConfigPatch, SerializerConfig};
///
/// let base = ConfigPatch::new().fields(["a", "b"]).use_natural_keys(true);
/// let local = ConfigPatch::new().exclude(["b"]);
/// let config = SerializerConfig::from_patch(&base.merged(&local));
///
/// assert_eq!(config.fields.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
/// assert!(config.is_excluded("b"));
/// assert_eq!(config.use_natural_keys, Some(true));
/// ```
#[derive(Clone, Default)]
pub struct ConfigPatch {
    pub fields: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub class_name: Option<ClassName>,
    pub field_serializer: Option<FieldFactory>,
    pub related_serializer: Option<FieldFactory>,
    pub m2m_serializer: Option<FieldFactory>,
    pub use_natural_keys: Option<bool>,
}

fn names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|n| n.as_ref().to_string()).collect()
}

impl ConfigPatch {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts dynamic fields to `names`; an empty list disables them.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fields = Some(names(fields));
        self
    }

    pub fn exclude<I, S>(mut self, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude = Some(names(exclude));
        self
    }

    pub fn class_name(mut self, class_name: ClassName) -> Self {
        self.class_name = Some(class_name);
        self
    }

    /// Reads the model identifier of created objects from `key`.
    #[inline]
    pub fn class_key(self, key: &str) -> Self {
        self.class_name(ClassName::Key(key.to_string()))
    }

    /// Creates every object as an instance of `meta`.
    #[inline]
    pub fn model(self, meta: Arc<ModelMeta>) -> Self {
        self.class_name(ClassName::Model(meta))
    }

    pub fn field_serializer(
        mut self,
        factory: impl Fn() -> FieldDescriptor + Send + Sync + 'static,
    ) -> Self {
        self.field_serializer = Some(Arc::new(factory));
        self
    }

    pub fn related_serializer(
        mut self,
        factory: impl Fn() -> FieldDescriptor + Send + Sync + 'static,
    ) -> Self {
        self.related_serializer = Some(Arc::new(factory));
        self
    }

    pub fn m2m_serializer(
        mut self,
        factory: impl Fn() -> FieldDescriptor + Send + Sync + 'static,
    ) -> Self {
        self.m2m_serializer = Some(Arc::new(factory));
        self
    }

    pub fn use_natural_keys(mut self, flag: bool) -> Self {
        self.use_natural_keys = Some(flag);
        self
    }

    /// Returns `self` overlaid with every option set in `over`.
    pub fn merged(&self, over: &ConfigPatch) -> ConfigPatch {
        ConfigPatch {
            fields: over.fields.clone().or_else(|| self.fields.clone()),
            exclude: over.exclude.clone().or_else(|| self.exclude.clone()),
            class_name: over.class_name.clone().or_else(|| self.class_name.clone()),
            field_serializer: over
                .field_serializer
                .clone()
                .or_else(|| self.field_serializer.clone()),
            related_serializer: over
                .related_serializer
                .clone()
                .or_else(|| self.related_serializer.clone()),
            m2m_serializer: over
                .m2m_serializer
                .clone()
                .or_else(|| self.m2m_serializer.clone()),
            use_natural_keys: over.use_natural_keys.or(self.use_natural_keys),
        }
    }
}

impl fmt::Debug for ConfigPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&SerializerConfig::from_patch(self), f)
    }
}
