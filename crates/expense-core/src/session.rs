//! One expense form's editing session: live input, quantity rules, and the
//! staging area that holds its computed results.

use std::collections::BTreeSet;

use chrono::{Datelike, Utc};
use expense_domain::{AllocationGroup, FormSnapshot, IdentityKey, Money, QuantityRule, SubEntity};
use tracing::debug;
use uuid::Uuid;

use crate::{
    allocation::AllocationSplitter,
    collaborators::{resolve_memo, DirectiveCatalog, MemoGenerator, OrgResolver, Persistence},
    commit::{CommitCoordinator, CommitReceipt},
    consolidation::ConsolidationGrouper,
    currency_input::CurrencyInputCodec,
    error::{CoreError, CoreResult},
    staging::{StagingArea, StagingPolicy, TotalsAndDestination},
    unit_cost::{QuantityRuleExt, QuantityWarning},
};

/// Live state and staging for one form instance.
#[derive(Debug)]
pub struct FormSession {
    category: String,
    quantity_rule: QuantityRule,
    live: FormSnapshot,
    warnings: BTreeSet<(String, String)>,
    staging: StagingArea<TotalsAndDestination>,
}

impl FormSession {
    pub fn new(
        category: impl Into<String>,
        quantity_rule: QuantityRule,
        policy: StagingPolicy,
    ) -> Self {
        let category = category.into();
        let live = FormSnapshot {
            category_family: Some(category.clone()),
            ..FormSnapshot::default()
        };
        Self {
            category,
            quantity_rule,
            live,
            warnings: BTreeSet::new(),
            staging: StagingArea::new(policy),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn live(&self) -> &FormSnapshot {
        &self.live
    }

    /// Direct access to header fields (holding org, days, phase...).
    pub fn live_mut(&mut self) -> &mut FormSnapshot {
        &mut self.live
    }

    pub fn staging(&self) -> &StagingArea<TotalsAndDestination> {
        &self.staging
    }

    pub fn staging_mut(&mut self) -> &mut StagingArea<TotalsAndDestination> {
        &mut self.staging
    }

    /// Replaces a sub-entity's items with the catalog defaults for `year`
    /// (the current year when `None`), creating the sub-entity if needed.
    pub fn seed_from_catalog(
        &mut self,
        catalog: &dyn DirectiveCatalog,
        sub_entity: &str,
        year: Option<i32>,
    ) -> usize {
        let year = year.unwrap_or_else(|| Utc::now().year());
        let items = catalog.load_defaults(&self.category, year);
        let count = items.len();
        let existing = self
            .live
            .sub_entities
            .iter()
            .position(|entity| entity.label == sub_entity);
        match existing {
            Some(index) => self.live.sub_entities[index].items = items,
            None => self.live.sub_entities.push(SubEntity::new(sub_entity, items)),
        }
        self.warnings.retain(|(entity, _)| entity != sub_entity);
        self.sync_warning_count();
        debug!(category = %self.category, year, count, "seeded items from catalog");
        count
    }

    /// Updates a quantity as it is typed. Step violations produce a warning
    /// that blocks staging until the field is blurred.
    pub fn set_quantity(
        &mut self,
        sub_entity: &str,
        key: &str,
        quantity: f64,
    ) -> CoreResult<Option<QuantityWarning>> {
        let item = self
            .live
            .sub_entity_mut(sub_entity)
            .and_then(|entity| entity.item_mut(key))
            .ok_or_else(|| item_not_found(sub_entity, key))?;
        item.set_quantity(quantity);
        let warning = self.quantity_rule.check_while_typing(key, item.quantity());
        let slot = (sub_entity.to_string(), key.to_string());
        if warning.is_some() {
            self.warnings.insert(slot);
        } else {
            self.warnings.remove(&slot);
        }
        self.sync_warning_count();
        Ok(warning)
    }

    /// Applies the step rule when the quantity field loses focus.
    pub fn blur_quantity(&mut self, sub_entity: &str, key: &str) -> CoreResult<f64> {
        let rule = self.quantity_rule;
        let item = self
            .live
            .sub_entity_mut(sub_entity)
            .and_then(|entity| entity.item_mut(key))
            .ok_or_else(|| item_not_found(sub_entity, key))?;
        let quantity = rule.apply_on_blur(key, item.quantity())?;
        item.set_quantity(quantity);
        self.warnings.remove(&(sub_entity.to_string(), key.to_string()));
        self.sync_warning_count();
        Ok(quantity)
    }

    pub fn set_usage_days(&mut self, sub_entity: &str, key: &str, days: f64) -> CoreResult<()> {
        let item = self
            .live
            .sub_entity_mut(sub_entity)
            .and_then(|entity| entity.item_mut(key))
            .ok_or_else(|| item_not_found(sub_entity, key))?;
        item.set_usage_days(days);
        Ok(())
    }

    /// Sets the requested service value from the raw digit buffer of the input field.
    pub fn set_requested_service_digits(&mut self, digits: &str) -> Money {
        let value = CurrencyInputCodec::digits_to_value(digits);
        self.live.requested_service = value;
        value
    }

    /// Resolves and stores the destination; unknown orgs clear it.
    pub fn resolve_destination(
        &mut self,
        resolver: &dyn OrgResolver,
        name: &str,
        unit_code: &str,
    ) -> bool {
        self.live.destination = resolver.resolve(name, unit_code);
        self.live.destination.is_some()
    }

    /// Recomputes the group from the live input.
    pub fn build_group(&self) -> AllocationGroup {
        AllocationSplitter::build_group(
            self.live.sub_entities.clone(),
            self.live.requested_service,
            self.live.destination.clone(),
            self.live.custom_memo.clone(),
        )
    }

    /// Stages the live calculation and returns its temp id.
    pub fn stage(&mut self, memo: &dyn MemoGenerator) -> CoreResult<Uuid> {
        let group = self.build_group();
        let display_memo = resolve_memo(&group, None, memo);
        let entry = self
            .staging
            .stage_new(group, self.live.clone(), display_memo)?;
        Ok(entry.temp_id)
    }

    pub fn is_dirty(&self) -> bool {
        self.staging.is_dirty(&self.live)
    }

    /// Loads a persisted group into the form and enters edit mode.
    pub fn load_for_edit(
        &mut self,
        grouper: &ConsolidationGrouper,
        key: &IdentityKey,
    ) -> CoreResult<AllocationGroup> {
        let group = grouper.expand(key)?;
        self.staging.begin_edit(key.clone())?;
        self.live = FormSnapshot {
            holding_org: key.holding_org.clone(),
            holding_unit: key.holding_unit.clone(),
            days: key.days,
            effective_count: key.effective_count,
            phase: key.phase.clone(),
            category_family: key.category_family.clone(),
            destination: group.destination.clone(),
            requested_service: group.service(),
            sub_entities: group.sub_entities.clone(),
            active_warnings: 0,
            custom_memo: group.custom_memo.clone(),
        };
        self.warnings.clear();
        Ok(group)
    }

    /// Commits staged entries, blocked while the live input is dirty.
    pub fn commit<P: Persistence>(
        &mut self,
        coordinator: &CommitCoordinator<P>,
        parent_id: Uuid,
    ) -> CoreResult<CommitReceipt> {
        coordinator.commit(&mut self.staging, parent_id, &self.live)
    }

    fn sync_warning_count(&mut self) {
        self.live.active_warnings = self.warnings.len();
    }
}

fn item_not_found(sub_entity: &str, key: &str) -> CoreError {
    CoreError::InvalidOperation(format!("no item '{}' under '{}'", key, sub_entity))
}
