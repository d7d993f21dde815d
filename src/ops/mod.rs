//! High-level operations.

pub mod convert;

pub use convert::{convert, ConvertOptions, ConvertResult};
