//! Crate root for the sequence-window classifier models.

pub mod architectures;
pub mod settings;
