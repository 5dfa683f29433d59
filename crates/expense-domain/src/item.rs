//! Priced line items and their pricing rules.

use serde::{Deserialize, Serialize};

use crate::{money::Money, NamedEntity};

/// Describes how a line item's subtotal is derived from its quantity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitBasis {
    /// `quantity × unit_value`.
    #[default]
    PerUnit,
    /// `quantity × unit_value × effective_days`, where the category may deduct
    /// a fraction of a day (per-diem rules deduct half a day).
    PerUnitPerUsageDay {
        #[serde(default)]
        half_day_deduction: f64,
    },
    /// `quantity × (unit_value / 30) × usage_days`.
    PerUnitProratedMonthly,
    /// `quantity × unit_value × ceil(usage_days / 365)`.
    PerUnitProratedAnnually,
}

impl UnitBasis {
    /// Per-diem style basis with a half-day deduction.
    pub fn per_diem() -> Self {
        UnitBasis::PerUnitPerUsageDay {
            half_day_deduction: 0.5,
        }
    }

    /// Returns `true` when the subtotal depends on `usage_days`.
    pub fn is_day_dependent(&self) -> bool {
        !matches!(self, UnitBasis::PerUnit)
    }
}

/// One priced entry on an expense form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    quantity: f64,
    pub unit_value: Money,
    pub unit_basis: UnitBasis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usage_days: Option<f64>,
}

impl LineItem {
    pub fn new(
        key: impl Into<String>,
        quantity: f64,
        unit_value: Money,
        unit_basis: UnitBasis,
    ) -> Self {
        Self {
            key: key.into(),
            label: None,
            quantity: clamp_non_negative(quantity),
            unit_value,
            unit_basis,
            usage_days: None,
        }
    }

    /// Convenience constructor for a `PerUnit` item.
    pub fn per_unit(key: impl Into<String>, quantity: f64, unit_value: Money) -> Self {
        Self::new(key, quantity, unit_value, UnitBasis::PerUnit)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_usage_days(mut self, days: f64) -> Self {
        self.set_usage_days(days);
        self
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Updates the quantity; negative or non-finite input is clamped to zero.
    pub fn set_quantity(&mut self, quantity: f64) {
        self.quantity = clamp_non_negative(quantity);
    }

    pub fn usage_days(&self) -> Option<f64> {
        self.usage_days
    }

    /// Updates the usage days; negative or non-finite input is clamped to zero.
    pub fn set_usage_days(&mut self, days: f64) {
        self.usage_days = Some(clamp_non_negative(days));
    }

    /// Usage days with a missing value read as zero.
    pub fn usage_days_or_zero(&self) -> f64 {
        self.usage_days.unwrap_or(0.0)
    }

    /// Returns `true` when the item contributes to a group total.
    pub fn is_active(&self) -> bool {
        if self.quantity <= 0.0 {
            return false;
        }
        !self.unit_basis.is_day_dependent() || self.usage_days_or_zero() > 0.0
    }
}

impl NamedEntity for LineItem {
    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// What happens to a quantity that breaks a step constraint once the field loses focus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlurAction {
    #[default]
    Reject,
    RoundToNearest,
}

/// Category-specific quantity constraint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuantityRule {
    #[default]
    Unconstrained,
    MultipleOf {
        step: u32,
        #[serde(default)]
        on_blur: BlurAction,
    },
}
