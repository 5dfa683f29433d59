//! Configured entry point tying sessions, commit and storage together.

use expense_config::{ConfigManager, EngineConfig};
use expense_core::{
    CommitCoordinator, CommitReceipt, ConsolidationGrouper, DirectiveCatalog, FormSession,
    MemoGenerator, NarrativeMemo, Persistence, StagingPolicy,
};
use expense_domain::{format::format_money, AllocationGroup, IdentityKey, Money};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::EngineResult;

/// Serializable view of one consolidated group.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupSummary {
    pub key: IdentityKey,
    pub label: String,
    pub sub_entities: Vec<String>,
    pub rows: usize,
    pub total: Money,
    pub material: Money,
    pub service: Money,
    pub formatted_total: String,
}

/// Engine bound to one configuration and one persistence backend.
pub struct ExpenseEngine<P> {
    config: EngineConfig,
    coordinator: CommitCoordinator<P>,
    memo: NarrativeMemo,
}

impl<P: Persistence> ExpenseEngine<P> {
    pub fn new(config: EngineConfig, persistence: P) -> EngineResult<Self> {
        config.validate()?;
        let coordinator = CommitCoordinator::new(persistence, config.remainder_policy);
        let memo = NarrativeMemo::new(config.locale.clone());
        info!(
            policy = ?config.remainder_policy,
            categories = config.categories.len(),
            "expense engine ready"
        );
        Ok(Self {
            config,
            coordinator,
            memo,
        })
    }

    /// Builds the engine from the config stored by `manager`.
    pub fn from_manager(manager: &ConfigManager, persistence: P) -> EngineResult<Self> {
        let config = manager.load()?;
        Self::new(config, persistence)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn persistence(&self) -> &P {
        self.coordinator.persistence()
    }

    /// Opens a form session with the rules configured for `category`.
    pub fn open_session(&self, category: &str) -> FormSession {
        let rules = self.config.rules_for(category);
        let policy = StagingPolicy {
            tolerance: self.config.tolerance(),
            require_positive_days: rules.require_positive_days,
            require_positive_effective_count: rules.require_positive_effective_count,
        };
        debug!(category, "opening form session");
        FormSession::new(category, rules.quantity_rule, policy)
    }

    /// Seeds a sub-entity from the catalog, applying the category's day rules.
    pub fn seed(
        &self,
        session: &mut FormSession,
        catalog: &dyn DirectiveCatalog,
        sub_entity: &str,
        year: Option<i32>,
    ) -> usize {
        let count = session.seed_from_catalog(catalog, sub_entity, year);
        let rules = self.config.rules_for(session.category());
        if let Some(entity) = session.live_mut().sub_entity_mut(sub_entity) {
            for item in &mut entity.items {
                item.unit_basis = rules.apply_basis(item.unit_basis);
            }
        }
        count
    }

    pub fn stage(&self, session: &mut FormSession) -> EngineResult<Uuid> {
        Ok(session.stage(&self.memo)?)
    }

    pub fn commit(
        &self,
        session: &mut FormSession,
        parent_id: Uuid,
    ) -> EngineResult<CommitReceipt> {
        Ok(session.commit(&self.coordinator, parent_id)?)
    }

    pub fn load(&self, parent_id: Uuid) -> EngineResult<ConsolidationGrouper> {
        Ok(self.coordinator.load(parent_id)?)
    }

    /// Opens `key` from storage into a fresh session in edit mode.
    pub fn edit(&self, parent_id: Uuid, key: &IdentityKey) -> EngineResult<FormSession> {
        let grouper = self.load(parent_id)?;
        let category = key.category_family.clone().unwrap_or_default();
        let mut session = self.open_session(&category);
        session.load_for_edit(&grouper, key)?;
        Ok(session)
    }

    pub fn delete_group(&self, parent_id: Uuid, key: &IdentityKey) -> EngineResult<()> {
        Ok(self.coordinator.delete_group(parent_id, key)?)
    }

    pub fn describe(&self, group: &AllocationGroup) -> String {
        self.memo.describe(group)
    }

    pub fn format_money(&self, value: Money) -> String {
        format_money(&self.config.locale, value)
    }

    pub fn summaries(&self, parent_id: Uuid) -> EngineResult<Vec<GroupSummary>> {
        let summaries = self
            .load(parent_id)?
            .summaries()
            .into_iter()
            .map(|group| GroupSummary {
                label: group.key.to_string(),
                rows: group.record_ids.len(),
                formatted_total: self.format_money(group.total_value),
                key: group.key,
                sub_entities: group.sub_entity_labels,
                total: group.total_value,
                material: group.material,
                service: group.service,
            })
            .collect();
        Ok(summaries)
    }

    /// Consolidated groups under `parent_id` as pretty JSON.
    pub fn export_summaries(&self, parent_id: Uuid) -> EngineResult<String> {
        let summaries = self.summaries(parent_id)?;
        Ok(serde_json::to_string_pretty(&summaries)?)
    }
}
