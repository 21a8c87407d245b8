//! Encyclopedia implementations.

#[cfg(feature = "wikipedia")]
mod wikipedia;

#[cfg(feature = "wikipedia")]
pub use wikipedia::WikipediaEncyclopedia;
