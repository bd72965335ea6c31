//! Persistence of region documents

pub mod document;
pub mod error;
pub mod region_storage;

pub use document::{Node, Section};
pub use error::{atomic_write, PersistenceError, PersistenceErrorContext, PersistenceResult};
pub use region_storage::RegionStorage;
