use alloc::string::{String, ToString};
use alloc::sync::Arc;

use log::debug;
use vc_utils::hash::{HashMap, HashSet};

use super::ModelMeta;
use crate::error::DeserializationError;

// -----------------------------------------------------------------------------
// ModelRegistry

/// Resolves model identifiers to model classes.
///
/// Identifiers are `app_label.model_name`, matched case-insensitively. A bare
/// model name also resolves, as long as only one app registers it.
///
/// # Examples
///
/// ```
/// use vc_serializer::model::{ModelMeta, ModelRegistry};
///
/// let mut registry = ModelRegistry::new();
/// registry.register(ModelMeta::builder("blog", "Article").build());
/// registry.register(ModelMeta::builder("news", "Article").build());
/// registry.register(ModelMeta::builder("blog", "Author").build());
///
/// assert!(registry.resolve("Blog.Article").is_ok());
/// assert!(registry.resolve("author").is_ok());
/// assert!(registry.is_ambiguous("article"));
/// assert!(registry.resolve("article").is_err());
/// ```
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelMeta>>,
    name_to_label: HashMap<String, String>,
    ambiguous_names: HashSet<String>,
}

impl ModelRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model, replacing any previous model with the same label.
    pub fn register(&mut self, meta: Arc<ModelMeta>) {
        let label = meta.label().to_string();
        if self.models.insert(label.clone(), meta).is_some() {
            debug!("model `{label}` re-registered");
            return;
        }

        let name = match label.split_once('.') {
            Some((_, name)) => name.to_string(),
            None => label.clone(),
        };
        if !self.ambiguous_names.contains(&name) {
            if self.name_to_label.contains_key(&name) {
                self.name_to_label.remove(&name);
                self.ambiguous_names.insert(name);
            } else {
                self.name_to_label.insert(name, label);
            }
        }
    }

    /// Looks a model up by its exact label, ignoring case.
    pub fn get(&self, label: &str) -> Option<&Arc<ModelMeta>> {
        self.models.get(&label.to_lowercase())
    }

    /// Returns `true` if a bare model name matches more than one model.
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous_names.contains(&name.to_lowercase())
    }

    /// Resolves an `app_label.model_name` identifier, or an unambiguous
    /// bare model name.
    pub fn resolve(&self, identifier: &str) -> Result<Arc<ModelMeta>, DeserializationError> {
        let key = identifier.to_lowercase();
        let found = if key.contains('.') {
            self.models.get(&key)
        } else {
            self.name_to_label
                .get(&key)
                .and_then(|label| self.models.get(label))
        };
        found
            .cloned()
            .ok_or_else(|| DeserializationError::InvalidModelIdentifier(identifier.to_string()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelMeta>> {
        self.models.values()
    }
}
