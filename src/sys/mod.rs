//! Definições de Sistema.

pub mod types;

pub use types::Tid;
