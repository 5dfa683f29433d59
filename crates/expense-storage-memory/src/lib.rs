//! expense-storage-memory
//!
//! In-memory collaborators for the expense engine: row persistence with
//! failure injection, a year-versioned directive catalog and a fixed org
//! reference table.

pub mod catalog;
pub mod persistence;
pub mod resolver;

pub use catalog::StaticCatalog;
pub use persistence::InMemoryPersistence;
pub use resolver::StaticOrgResolver;
