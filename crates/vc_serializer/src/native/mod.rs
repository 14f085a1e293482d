//! The format-neutral value tree and its metadata carrier.

mod metadata;
mod node;
mod scalar;
mod serde;

pub use metadata::{Hint, Metadata};
pub use node::{Native, NativeMap, Node};
pub use scalar::{Decimal, ParseDecimalError, Scalar};
