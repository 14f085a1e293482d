//! JSON: a single array, written as objects are produced.

use std::io;

use vc_serializer::native::Native;
use vc_serializer::{DeserializationError, SerializationError};

use crate::format::{Format, NodeStream, parse_error, render_error};

const NAME: &str = "json";

/// Renders the object stream as one JSON array.
///
/// Dates and times are written as ISO 8601 strings and decimals as strings,
/// so nothing is lost to floating point.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat {
    pretty: bool,
}

impl JsonFormat {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indents the output, one object per block.
    #[inline]
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Format for JsonFormat {
    #[inline]
    fn name(&self) -> &str {
        NAME
    }

    fn render(
        &self,
        nodes: &mut NodeStream<'_>,
        out: &mut dyn io::Write,
    ) -> Result<(), SerializationError> {
        let fail = |e: io::Error| render_error(NAME, e);
        out.write_all(b"[").map_err(fail)?;
        for (index, node) in nodes.enumerate() {
            let node = node?;
            if index > 0 {
                out.write_all(b",").map_err(fail)?;
            }
            let written = if self.pretty {
                out.write_all(b"\n").map_err(fail)?;
                serde_json::to_writer_pretty(&mut *out, &node)
            } else {
                serde_json::to_writer(&mut *out, &node)
            };
            written.map_err(|e| render_error(NAME, e))?;
        }
        if self.pretty {
            out.write_all(b"\n").map_err(fail)?;
        }
        out.write_all(b"]").map_err(fail)?;
        out.flush().map_err(fail)
    }

    fn parse(&self, input: &[u8]) -> Result<Native, DeserializationError> {
        serde_json::from_slice(input).map_err(|e| parse_error(NAME, e))
    }
}
