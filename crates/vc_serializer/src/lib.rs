#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod container;
mod engine;
mod resolve;

pub mod config;
pub mod error;
pub mod field;
pub mod model;
pub mod native;
pub mod schema;

// -----------------------------------------------------------------------------
// Top-level exports

pub use config::{ClassName, ConfigPatch, SerializerConfig};
pub use container::DeserializedObject;
pub use engine::{Context, ObjectSerializer, ObjectSerializerBuilder, SerializeIter};
pub use error::{
    DeserializationError, Error, SerializationError, SerializerDoesNotExist, SerializerError,
    StoreError,
};
