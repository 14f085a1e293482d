#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

extern crate alloc;

// Renderers write to `std::io` streams.
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod format;

pub mod dump;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "yaml")]
pub mod yaml;

#[cfg(feature = "xml")]
pub mod xml;

// -----------------------------------------------------------------------------
// Top-level exports

pub use format::{Format, FormatRegistry, NodeStream};
