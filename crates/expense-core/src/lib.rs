//! expense-core
//!
//! Allocation, staging, and consolidation services for expense forms.
//! Depends on expense-domain. No UI, no terminal I/O, no direct storage; every
//! outside system is reached through the traits in [`collaborators`].

pub mod allocation;
pub mod collaborators;
pub mod commit;
pub mod consolidation;
pub mod currency_input;
pub mod error;
pub mod session;
pub mod staging;
pub mod unit_cost;

pub use allocation::*;
pub use collaborators::*;
pub use commit::*;
pub use consolidation::*;
pub use currency_input::*;
pub use error::*;
pub use session::*;
pub use staging::*;
pub use unit_cost::*;
