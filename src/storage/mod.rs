//! Document store abstraction and the in-memory implementation.

pub mod memory;
pub mod traits;
