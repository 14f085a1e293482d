use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};

use vc_utils::OrderedMap;

use super::{Metadata, Scalar};

/// An ordered mapping of native values.
pub type NativeMap = OrderedMap<String, Node>;

// -----------------------------------------------------------------------------
// Native

/// A format-neutral value tree.
///
/// This is what serialization produces and what deserialization consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum Native {
    Scalar(Scalar),
    Mapping(NativeMap),
    Sequence(Vec<Node>),
}

impl Native {
    pub const NULL: Self = Self::Scalar(Scalar::Null);

    /// A short name of the shape, used in error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(s) => s.kind_name(),
            Self::Mapping(_) => "mapping",
            Self::Sequence(_) => "sequence",
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Scalar::Null))
    }

    #[inline]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_mapping(&self) -> Option<&NativeMap> {
        match self {
            Self::Mapping(m) => Some(m),
            _ => None,
        }
    }

    #[inline]
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Self::Sequence(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    /// Drops every metadata carrier in the tree.
    pub fn strip(&mut self) {
        match self {
            Self::Scalar(_) => {}
            Self::Mapping(map) => map.values_mut().for_each(Node::strip),
            Self::Sequence(seq) => seq.iter_mut().for_each(Node::strip),
        }
    }
}

impl Default for Native {
    #[inline]
    fn default() -> Self {
        Self::NULL
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Native {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool, i32, i64, u32, f64, &str, String,
    super::Decimal, chrono::NaiveDate, chrono::NaiveTime, chrono::NaiveDateTime,
}

impl From<Scalar> for Native {
    #[inline]
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<NativeMap> for Native {
    #[inline]
    fn from(value: NativeMap) -> Self {
        Self::Mapping(value)
    }
}

impl From<Vec<Node>> for Native {
    #[inline]
    fn from(value: Vec<Node>) -> Self {
        Self::Sequence(value)
    }
}

// -----------------------------------------------------------------------------
// Node

/// A native value together with its optional metadata carrier.
///
/// Dereferences to the plain [`Native`]; equality ignores metadata, so a
/// decorated tree compares equal to the same tree without decoration.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub value: Native,
    pub metadata: Option<Box<Metadata>>,
}

impl Node {
    #[inline]
    pub fn new(value: impl Into<Native>) -> Self {
        Self {
            value: value.into(),
            metadata: None,
        }
    }

    #[inline]
    pub fn with_metadata(value: impl Into<Native>, metadata: Metadata) -> Self {
        let metadata = (!metadata.is_empty()).then(|| Box::new(metadata));
        Self {
            value: value.into(),
            metadata,
        }
    }

    #[inline]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_deref()
    }

    /// Returns the carrier, creating an empty one if absent.
    #[inline]
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        self.metadata.get_or_insert_with(Default::default)
    }

    /// Removes metadata from this node and all descendants.
    pub fn strip(&mut self) {
        self.metadata = None;
        self.value.strip();
    }

    #[inline]
    pub fn into_native(self) -> Native {
        self.value
    }

    /// Consumes the node, returning the bare tree without any metadata.
    pub fn stripped(mut self) -> Native {
        self.value.strip();
        self.value
    }
}

impl Deref for Node {
    type Target = Native;

    #[inline]
    fn deref(&self) -> &Native {
        &self.value
    }
}

impl DerefMut for Node {
    #[inline]
    fn deref_mut(&mut self) -> &mut Native {
        &mut self.value
    }
}

impl PartialEq for Node {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<Native> for Node {
    #[inline]
    fn eq(&self, other: &Native) -> bool {
        &self.value == other
    }
}

impl From<Native> for Node {
    #[inline]
    fn from(value: Native) -> Self {
        Self::new(value)
    }
}
