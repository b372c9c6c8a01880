pub mod codec;
pub mod engine;
pub mod error;
pub mod presentation;
pub mod store;

// Re-export main components
pub use codec::*;
pub use engine::*;
pub use error::*;
pub use presentation::*;
pub use store::*;
