//! Value module - In-memory representation of resource trees.
//!
//! Objects are read from and written to YAML/JSON through this module.

mod value;

pub use value::*;
