//! Output generation.

pub mod cmake;

pub use cmake::emit;
