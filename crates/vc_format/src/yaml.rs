//! YAML: a single sequence document.

use alloc::vec::Vec;
use std::io;

use vc_serializer::native::{Native, Node};
use vc_serializer::{DeserializationError, SerializationError};

use crate::format::{Format, NodeStream, parse_error, render_error};

const NAME: &str = "yaml";

/// Renders the object stream as one YAML sequence.
///
/// The emitter needs the whole document, so objects are collected before
/// anything is written.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl Format for YamlFormat {
    #[inline]
    fn name(&self) -> &str {
        NAME
    }

    fn render(
        &self,
        nodes: &mut NodeStream<'_>,
        out: &mut dyn io::Write,
    ) -> Result<(), SerializationError> {
        let nodes = nodes.collect::<Result<Vec<Node>, _>>()?;
        serde_yaml::to_writer(&mut *out, &nodes).map_err(|e| render_error(NAME, e))?;
        out.flush().map_err(|e| render_error(NAME, e))
    }

    fn parse(&self, input: &[u8]) -> Result<Native, DeserializationError> {
        serde_yaml::from_slice(input).map_err(|e| parse_error(NAME, e))
    }
}
