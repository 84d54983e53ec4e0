//! Neural architectures.

pub mod base;
