// HTTP routes
pub mod health;
pub mod index;
pub mod reports;

pub use health::*;
pub use index::*;
pub use reports::*;
