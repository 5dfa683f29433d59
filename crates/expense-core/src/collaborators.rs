//! Interfaces to the systems surrounding the engine, plus a plain-text memo
//! generator hosts can use when they have none of their own.

use std::fmt::Write as _;

use expense_domain::{
    format::{format_money, LocaleConfig},
    AllocationGroup, Displayable, IdentityKey, LineItem, NamedEntity, OrgRef, PersistedRecord,
    UnitBasis,
};
use uuid::Uuid;

use crate::{error::PersistenceError, unit_cost::UnitCostCalculator};

/// Storage for persisted rows. Calls are made one at a time per form session.
pub trait Persistence: Send + Sync {
    fn insert(&self, records: Vec<PersistedRecord>) -> Result<(), PersistenceError>;
    fn delete_by_ids(&self, ids: &[Uuid]) -> Result<(), PersistenceError>;
    /// Removes every row of one group under the given parent work plan.
    fn delete_by_identity_key(
        &self,
        parent_id: Uuid,
        key: &IdentityKey,
    ) -> Result<(), PersistenceError>;
    fn query_by_parent(&self, parent_id: Uuid) -> Result<Vec<PersistedRecord>, PersistenceError>;
}

/// Read-only source of starting unit values and quantities.
pub trait DirectiveCatalog {
    fn load_defaults(&self, category: &str, year: i32) -> Vec<LineItem>;
}

/// Looks up organizational references by name and unit code.
pub trait OrgResolver {
    fn resolve(&self, name: &str, unit_code: &str) -> Option<OrgRef>;
}

/// Produces the human-readable calculation narrative for a group.
pub trait MemoGenerator {
    fn describe(&self, group: &AllocationGroup) -> String;
}

/// Picks the memo shown for a group: a non-blank override wins, otherwise the
/// generated narrative.
pub fn resolve_memo(
    group: &AllocationGroup,
    custom_override: Option<&str>,
    generator: &dyn MemoGenerator,
) -> String {
    match custom_override
        .or_else(|| group.custom_memo())
        .map(str::trim)
        .filter(|memo| !memo.is_empty())
    {
        Some(memo) => memo.to_string(),
        None => generator.describe(group),
    }
}

/// Line-per-item narrative of how a group total was reached.
#[derive(Debug, Clone, Default)]
pub struct NarrativeMemo {
    pub locale: LocaleConfig,
}

impl NarrativeMemo {
    pub fn new(locale: LocaleConfig) -> Self {
        Self { locale }
    }

    fn describe_item(&self, item: &LineItem) -> String {
        let quantity = format_quantity(item.quantity());
        let unit = format_money(&self.locale, item.unit_value);
        let subtotal = format_money(&self.locale, UnitCostCalculator::compute_item_total(item));
        let days = item.usage_days_or_zero();
        let formula = match item.unit_basis {
            UnitBasis::PerUnit => format!("{} x {}", quantity, unit),
            UnitBasis::PerUnitPerUsageDay { half_day_deduction } => format!(
                "{} x {} x {} day(s)",
                quantity,
                unit,
                format_quantity((days - half_day_deduction.max(0.0)).max(0.0))
            ),
            UnitBasis::PerUnitProratedMonthly => format!(
                "{} x ({} / 30) x {} day(s)",
                quantity,
                unit,
                format_quantity(days)
            ),
            UnitBasis::PerUnitProratedAnnually => {
                let years = if days <= 0.0 { 0.0 } else { (days / 365.0).ceil() };
                format!("{} x {} x {} year(s)", quantity, unit, format_quantity(years))
            }
        };
        format!("{}: {} = {}", item.name(), formula, subtotal)
    }
}

impl MemoGenerator for NarrativeMemo {
    fn describe(&self, group: &AllocationGroup) -> String {
        let mut out = String::new();
        if let Some(destination) = group.destination() {
            let _ = writeln!(out, "Destination: {}", destination.display_label());
        }
        let labelled = group.sub_entities.len() > 1;
        for entity in &group.sub_entities {
            let active: Vec<&LineItem> = entity.items.iter().filter(|i| i.is_active()).collect();
            if active.is_empty() {
                continue;
            }
            if labelled {
                let _ = writeln!(out, "[{}]", entity.name());
            }
            for item in active {
                let _ = writeln!(out, "{}", self.describe_item(item));
            }
        }
        let _ = write!(
            out,
            "Total: {} (ND 30: {} | ND 39: {})",
            format_money(&self.locale, group.total_value),
            format_money(&self.locale, group.material()),
            format_money(&self.locale, group.service())
        );
        out
    }
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let rendered = format!("{:.2}", value);
        rendered.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::AllocationSplitter;
    use expense_domain::{Money, SubEntity};

    fn sample_group(memo: Option<&str>) -> AllocationGroup {
        AllocationSplitter::build_group(
            vec![SubEntity::new(
                "General",
                vec![
                    LineItem::per_unit("tires", 3.0, Money::from_major(10, 0)).with_label("Tires"),
                    LineItem::new(
                        "rent",
                        2.0,
                        Money::from_major(15, 0),
                        UnitBasis::PerUnitProratedMonthly,
                    )
                    .with_usage_days(10.0),
                ],
            )],
            Money::from_major(15, 0),
            Some(OrgRef::new("1º BPM", "160222")),
            memo.map(str::to_string),
        )
    }

    #[test]
    fn narrative_lists_items_and_buckets() {
        let memo = NarrativeMemo::default().describe(&sample_group(None));
        let lines: Vec<&str> = memo.lines().collect();
        assert_eq!(lines[0], "Destination: 1º BPM (160222)");
        assert_eq!(lines[1], "Tires: 3 x R$ 10,00 = R$ 30,00");
        assert_eq!(lines[2], "rent: 2 x (R$ 15,00 / 30) x 10 day(s) = R$ 10,00");
        assert_eq!(
            lines[3],
            "Total: R$ 40,00 (ND 30: R$ 25,00 | ND 39: R$ 15,00)"
        );
    }

    #[test]
    fn override_wins_over_generated_text() {
        let generator = NarrativeMemo::default();
        let group = sample_group(None);
        assert_eq!(resolve_memo(&group, Some(" custom "), &generator), "custom");
        assert_eq!(
            resolve_memo(&group, Some("   "), &generator),
            generator.describe(&group)
        );
    }

    #[test]
    fn group_memo_is_used_when_no_override_given() {
        let generator = NarrativeMemo::default();
        let group = sample_group(Some("stored memo"));
        assert_eq!(resolve_memo(&group, None, &generator), "stored memo");
    }

    #[test]
    fn fractional_quantities_trim_trailing_zeros() {
        assert_eq!(format_quantity(2.5), "2.5");
        assert_eq!(format_quantity(3.0), "3");
    }
}
