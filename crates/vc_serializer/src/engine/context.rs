use core::fmt;

use crate::model::{ModelRegistry, NaturalKeyLookup};

// -----------------------------------------------------------------------------
// Context

/// Per-call state, threaded explicitly through every serializer and field.
///
/// Serializers themselves hold no call state, so one instance can be shared
/// between threads and re-entered freely.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    registry: &'a ModelRegistry,
    lookup: Option<&'a dyn NaturalKeyLookup>,
    use_natural_keys: bool,
}

impl<'a> Context<'a> {
    #[inline]
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self {
            registry,
            lookup: None,
            use_natural_keys: false,
        }
    }

    /// Sets the capability used to turn natural keys back into primary keys.
    #[inline]
    pub fn with_lookup(mut self, lookup: &'a dyn NaturalKeyLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Serializes relations as natural keys where the related model has one.
    #[inline]
    pub fn with_natural_keys(mut self, flag: bool) -> Self {
        self.use_natural_keys = flag;
        self
    }

    #[inline]
    pub fn registry(&self) -> &'a ModelRegistry {
        self.registry
    }

    #[inline]
    pub fn lookup(&self) -> Option<&'a dyn NaturalKeyLookup> {
        self.lookup
    }

    #[inline]
    pub fn use_natural_keys(&self) -> bool {
        self.use_natural_keys
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("models", &self.registry.len())
            .field("lookup", &self.lookup.is_some())
            .field("use_natural_keys", &self.use_natural_keys)
            .finish()
    }
}
