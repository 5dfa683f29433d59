//! expense-domain
//!
//! Pure domain models for expense forms (line items, allocation groups,
//! form snapshots, persisted rows).
//! No I/O, no services. Only data types, core enums, and display helpers.

pub mod common;
pub mod format;
pub mod group;
pub mod item;
pub mod money;
pub mod record;
pub mod snapshot;

pub use common::*;
pub use group::*;
pub use item::*;
pub use money::*;
pub use record::*;
pub use snapshot::*;
