//! Language model implementations.
//!
//! Reference implementations of the `LanguageModel` trait. Applications can
//! use these directly or implement their own.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::{LlmProvider, OpenAILanguageModel};
