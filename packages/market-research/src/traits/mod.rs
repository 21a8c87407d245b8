//! Seams to the external services the pipeline depends on.
//!
//! Applications implement these to plug in a language model and an
//! encyclopedia; `testing` provides in-memory versions.

pub mod encyclopedia;
pub mod llm;
