use super::Field;

/// A pass-through field.
///
/// Reads the attribute of its name, or the whole source object when there is
/// none, and writes back whatever it is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainField;

impl Field for PlainField {}
