use std::collections::BTreeMap;

use expense_core::DirectiveCatalog;
use expense_domain::LineItem;

/// Directive defaults per category, versioned by the year they take effect.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entries: BTreeMap<String, BTreeMap<i32, Vec<LineItem>>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the items that apply to `category` from `effective_year` on.
    pub fn with_defaults(
        mut self,
        category: impl Into<String>,
        effective_year: i32,
        items: Vec<LineItem>,
    ) -> Self {
        self.insert(category, effective_year, items);
        self
    }

    pub fn insert(
        &mut self,
        category: impl Into<String>,
        effective_year: i32,
        items: Vec<LineItem>,
    ) {
        self.entries
            .entry(category.into())
            .or_default()
            .insert(effective_year, items);
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl DirectiveCatalog for StaticCatalog {
    /// Most recent directive in effect for `year`; empty when none applies.
    fn load_defaults(&self, category: &str, year: i32) -> Vec<LineItem> {
        self.entries
            .get(category)
            .and_then(|versions| versions.range(..=year).next_back())
            .map(|(_, items)| items.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expense_domain::Money;

    fn catalog() -> StaticCatalog {
        StaticCatalog::new()
            .with_defaults(
                "veterinary",
                2023,
                vec![LineItem::per_unit("vaccine", 0.0, Money::from_cents(1000))],
            )
            .with_defaults(
                "veterinary",
                2025,
                vec![LineItem::per_unit("vaccine", 0.0, Money::from_cents(1250))],
            )
    }

    #[test]
    fn picks_latest_version_in_effect() {
        let catalog = catalog();
        assert_eq!(
            catalog.load_defaults("veterinary", 2024)[0].unit_value,
            Money::from_cents(1000)
        );
        assert_eq!(
            catalog.load_defaults("veterinary", 2026)[0].unit_value,
            Money::from_cents(1250)
        );
    }

    #[test]
    fn unknown_category_or_early_year_is_empty() {
        let catalog = catalog();
        assert!(catalog.load_defaults("veterinary", 2020).is_empty());
        assert!(catalog.load_defaults("tires", 2025).is_empty());
    }
}
