#![doc(test(attr(deny(warnings))))]

//! Expense Engine computes expense-form line items, splits each group's
//! value between the material and service budget buckets, stages results for
//! review and hands them to storage as one row per sub-entity.

pub mod engine;
pub mod errors;
pub mod utils;

pub use engine::{ExpenseEngine, GroupSummary};
pub use errors::{EngineError, EngineResult};
pub use expense_config as config;
pub use expense_core as services;
pub use expense_domain as domain;
pub use expense_storage_memory as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    init_with_filter(None);
}

/// Like [`init`], using the `log_filter` from `config` when set.
pub fn init_with(config: &config::EngineConfig) {
    init_with_filter(config.log_filter.as_deref());
}

fn init_with_filter(directive: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(directive);
        tracing::info!(filter = directive.unwrap_or("default"), "Expense engine tracing initialized.");
    });
}
