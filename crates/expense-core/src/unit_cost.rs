//! Converts line item quantities into monetary subtotals.

use expense_domain::{BlurAction, LineItem, Money, QuantityRule, SubEntity, UnitBasis};

use crate::error::InputValidationError;

const DAYS_PER_MONTH: f64 = 30.0;
const DAYS_PER_YEAR: f64 = 365.0;
const STEP_EPSILON: f64 = 1e-9;

/// Stateless pricing rules over [`LineItem`]s.
pub struct UnitCostCalculator;

impl UnitCostCalculator {
    /// Subtotal of one item under its unit basis.
    pub fn compute_item_total(item: &LineItem) -> Money {
        let quantity = item.quantity();
        let days = item.usage_days_or_zero();
        let factor = match item.unit_basis {
            UnitBasis::PerUnit => quantity,
            UnitBasis::PerUnitPerUsageDay { half_day_deduction } => {
                let effective_days = if half_day_deduction > 0.0 {
                    (days - half_day_deduction).max(0.0)
                } else {
                    days
                };
                quantity * effective_days
            }
            UnitBasis::PerUnitProratedMonthly => quantity * days / DAYS_PER_MONTH,
            UnitBasis::PerUnitProratedAnnually => {
                if days <= 0.0 {
                    0.0
                } else {
                    quantity * (days / DAYS_PER_YEAR).ceil()
                }
            }
        };
        scale(item.unit_value, factor)
    }

    /// Sum of item subtotals, skipping items that do not contribute.
    pub fn compute_group_total(items: &[LineItem]) -> Money {
        items
            .iter()
            .filter(|item| item.is_active())
            .map(Self::compute_item_total)
            .sum()
    }

    /// Total across every sub-entity of a form.
    pub fn compute_entities_total(entities: &[SubEntity]) -> Money {
        entities
            .iter()
            .map(|entity| Self::compute_group_total(&entity.items))
            .sum()
    }

    /// Maps raw numeric input onto a usable quantity; anything malformed is zero.
    pub fn normalize_quantity(raw: f64) -> f64 {
        if raw.is_finite() && raw > 0.0 {
            raw
        } else {
            0.0
        }
    }

    pub fn normalize_days(raw: f64) -> f64 {
        Self::normalize_quantity(raw)
    }

    /// Parses a typed quantity, accepting a comma as the decimal separator.
    pub fn parse_quantity(raw: &str) -> f64 {
        let cleaned = raw.trim().replace(',', ".");
        cleaned
            .parse::<f64>()
            .map(Self::normalize_quantity)
            .unwrap_or(0.0)
    }
}

/// Multiplies a unit value by a fractional factor, rounding to the cent once.
fn scale(unit_value: Money, factor: f64) -> Money {
    let cents = unit_value.cents() as f64 * factor;
    if !cents.is_finite() {
        return Money::ZERO;
    }
    Money::from_cents(cents.round() as i64)
}

/// Non-blocking notice shown while a constrained quantity is being typed.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityWarning {
    pub key: String,
    pub quantity: f64,
    pub step: u32,
    /// Nearest valid quantity.
    pub suggestion: f64,
}

/// Applies a category's quantity constraint at the two points the form checks it.
pub trait QuantityRuleExt {
    /// Checked on every keystroke; never blocks.
    fn check_while_typing(&self, key: &str, quantity: f64) -> Option<QuantityWarning>;
    /// Checked when the field loses focus; rejects or rounds per the rule.
    fn apply_on_blur(&self, key: &str, quantity: f64) -> Result<f64, InputValidationError>;
}

impl QuantityRuleExt for QuantityRule {
    fn check_while_typing(&self, key: &str, quantity: f64) -> Option<QuantityWarning> {
        let step = active_step(self)?;
        if is_multiple(quantity, step) {
            return None;
        }
        Some(QuantityWarning {
            key: key.to_string(),
            quantity,
            step,
            suggestion: nearest_multiple(quantity, step),
        })
    }

    fn apply_on_blur(&self, key: &str, quantity: f64) -> Result<f64, InputValidationError> {
        let quantity = UnitCostCalculator::normalize_quantity(quantity);
        let Some(step) = active_step(self) else {
            return Ok(quantity);
        };
        if is_multiple(quantity, step) {
            return Ok(quantity);
        }
        match self {
            QuantityRule::MultipleOf {
                on_blur: BlurAction::RoundToNearest,
                ..
            } => Ok(nearest_multiple(quantity, step)),
            _ => Err(InputValidationError::QuantityStep {
                key: key.to_string(),
                quantity,
                step,
            }),
        }
    }
}

fn active_step(rule: &QuantityRule) -> Option<u32> {
    match rule {
        QuantityRule::MultipleOf { step, .. } if *step > 1 => Some(*step),
        _ => None,
    }
}

fn is_multiple(quantity: f64, step: u32) -> bool {
    let ratio = quantity / f64::from(step);
    (ratio - ratio.round()).abs() < STEP_EPSILON
}

fn nearest_multiple(quantity: f64, step: u32) -> f64 {
    let step = f64::from(step);
    (quantity / step).round() * step
}
