use alloc::string::{String, ToString};
use alloc::vec::Vec;

use vc_utils::OrderedMap;

use super::NativeMap;

// -----------------------------------------------------------------------------
// Hint

/// A single rendering hint carried beside a native value.
#[derive(Debug, Clone, PartialEq)]
pub enum Hint {
    Flag(bool),
    Text(String),
    List(Vec<String>),
}

// -----------------------------------------------------------------------------
// Metadata

/// Rendering hints attached to a [`Node`](super::Node).
///
/// Metadata never participates in value equality. Renderers that understand
/// a hint use it; all others ignore it.
///
/// Well-known hints:
/// - `attributes`: names of child entries to render as element attributes.
/// - `item_name`: tag name for entries of a sequence.
/// - `as_list`: the value is a sequence even when it looks like a mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    hints: OrderedMap<String, Hint>,
    fields: Option<NativeMap>,
}

impl Metadata {
    pub const ATTRIBUTES: &'static str = "attributes";
    pub const ITEM_NAME: &'static str = "item_name";
    pub const AS_LIST: &'static str = "as_list";

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty() && self.fields.is_none()
    }

    #[inline]
    pub fn hint(&self, key: &str) -> Option<&Hint> {
        self.hints.get(key)
    }

    #[inline]
    pub fn set_hint(&mut self, key: impl Into<String>, hint: Hint) {
        self.hints.insert(key.into(), hint);
    }

    pub fn attributes(&self) -> &[String] {
        match self.hints.get(Self::ATTRIBUTES) {
            Some(Hint::List(names)) => names,
            _ => &[],
        }
    }

    /// Appends `name` to the attribute list, ignoring repeats.
    pub fn add_attribute(&mut self, name: &str) {
        if !matches!(self.hints.get(Self::ATTRIBUTES), Some(Hint::List(_))) {
            self.hints.insert(Self::ATTRIBUTES.to_string(), Hint::List(Vec::new()));
        }
        if let Some(Hint::List(names)) = self.hints.get_mut(Self::ATTRIBUTES)
            && !names.iter().any(|n| n == name)
        {
            names.push(name.to_string());
        }
    }

    pub fn item_name(&self) -> Option<&str> {
        match self.hints.get(Self::ITEM_NAME) {
            Some(Hint::Text(name)) => Some(name),
            _ => None,
        }
    }

    #[inline]
    pub fn set_item_name(&mut self, name: &str) {
        self.set_hint(Self::ITEM_NAME, Hint::Text(name.to_string()));
    }

    pub fn as_list(&self) -> bool {
        matches!(self.hints.get(Self::AS_LIST), Some(Hint::Flag(true)))
    }

    #[inline]
    pub fn set_as_list(&mut self, flag: bool) {
        self.set_hint(Self::AS_LIST, Hint::Flag(flag));
    }

    /// Overlays `other` on top of these hints.
    pub fn extend(&mut self, other: &Metadata) {
        for (key, hint) in other.hints.iter() {
            self.hints.insert(key.clone(), hint.clone());
        }
        if let Some(fields) = &other.fields {
            self.fields = Some(fields.clone());
        }
    }

    /// The sibling entries produced alongside this value, if recorded.
    #[inline]
    pub fn fields(&self) -> Option<&NativeMap> {
        self.fields.as_ref()
    }

    #[inline]
    pub fn set_fields(&mut self, fields: NativeMap) {
        self.fields = Some(fields);
    }
}

#[cfg(test)]
mod tests {
    use super::Metadata;

    #[test]
    fn attributes_are_deduplicated() {
        let mut meta = Metadata::new();
        assert!(meta.attributes().is_empty());
        meta.add_attribute("pk");
        meta.add_attribute("model");
        meta.add_attribute("pk");
        assert_eq!(meta.attributes(), ["pk", "model"]);
    }

    #[test]
    fn item_name_round_trip() {
        let mut meta = Metadata::new();
        assert_eq!(meta.item_name(), None);
        meta.set_item_name("object");
        assert_eq!(meta.item_name(), Some("object"));
        assert!(!meta.as_list());
    }
}
