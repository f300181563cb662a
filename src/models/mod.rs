pub mod delta;
pub mod product;
pub mod source;

// Re-exports for convenience
pub use delta::*;
pub use product::*;
pub use source::*;
