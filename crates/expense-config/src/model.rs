use std::{collections::BTreeMap, path::PathBuf};

use expense_domain::{format::LocaleConfig, Money, QuantityRule, RemainderPolicy, UnitBasis};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Engine-wide settings shared by every form session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub locale: LocaleConfig,
    /// Allowed drift between bucket sum and total, in cents.
    #[serde(default = "EngineConfig::default_tolerance_cents")]
    pub tolerance_cents: i64,
    #[serde(default)]
    pub remainder_policy: RemainderPolicy,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for the config file. Defaults to the platform config dir.
    pub config_root: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            locale: LocaleConfig::default(),
            tolerance_cents: Self::default_tolerance_cents(),
            remainder_policy: RemainderPolicy::default(),
            categories: BTreeMap::new(),
            log_filter: None,
            config_root: None,
        }
    }
}

impl EngineConfig {
    pub fn default_tolerance_cents() -> i64 {
        1
    }

    pub fn tolerance(&self) -> Money {
        Money::from_cents(self.tolerance_cents)
    }

    /// Rules for `category`; unknown categories get the permissive defaults.
    pub fn rules_for(&self, category: &str) -> CategoryRules {
        self.categories.get(category).cloned().unwrap_or_default()
    }

    pub fn set_rules(&mut self, category: impl Into<String>, rules: CategoryRules) {
        self.categories.insert(category.into(), rules);
    }

    pub fn resolve_config_root(&self) -> PathBuf {
        if let Some(path) = &self.config_root {
            return path.clone();
        }

        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("expense-engine")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tolerance_cents < 0 {
            return Err(ConfigError::Invalid(format!(
                "tolerance_cents must not be negative (got {})",
                self.tolerance_cents
            )));
        }
        for (category, rules) in &self.categories {
            rules
                .validate()
                .map_err(|reason| ConfigError::Invalid(format!("{}: {}", category, reason)))?;
        }
        Ok(())
    }
}

/// Per-category validation and pricing rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CategoryRules {
    /// Days subtracted from per-usage-day items of this category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_day_deduction: Option<f64>,
    #[serde(default)]
    pub quantity_rule: QuantityRule,
    #[serde(default)]
    pub require_positive_days: bool,
    #[serde(default)]
    pub require_positive_effective_count: bool,
}

impl CategoryRules {
    /// Rewrites a per-usage-day basis with this category's deduction.
    pub fn apply_basis(&self, basis: UnitBasis) -> UnitBasis {
        match (basis, self.half_day_deduction) {
            (UnitBasis::PerUnitPerUsageDay { .. }, Some(deduction)) => {
                UnitBasis::PerUnitPerUsageDay {
                    half_day_deduction: deduction,
                }
            }
            (other, _) => other,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if let Some(deduction) = self.half_day_deduction {
            if !deduction.is_finite() || deduction < 0.0 {
                return Err(format!("invalid half-day deduction {}", deduction));
            }
        }
        if let QuantityRule::MultipleOf { step: 0, .. } = self.quantity_rule {
            return Err("quantity step must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expense_domain::BlurAction;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.tolerance(), Money::CENT);
    }

    #[test]
    fn unknown_category_uses_permissive_rules() {
        let cfg = EngineConfig::default();
        let rules = cfg.rules_for("materiel");
        assert_eq!(rules.quantity_rule, QuantityRule::Unconstrained);
        assert!(!rules.require_positive_days);
    }

    #[test]
    fn deduction_overrides_only_usage_day_basis() {
        let rules = CategoryRules {
            half_day_deduction: Some(0.5),
            ..CategoryRules::default()
        };
        assert_eq!(
            rules.apply_basis(UnitBasis::PerUnitPerUsageDay {
                half_day_deduction: 0.0
            }),
            UnitBasis::per_diem()
        );
        assert_eq!(
            rules.apply_basis(UnitBasis::PerUnitProratedMonthly),
            UnitBasis::PerUnitProratedMonthly
        );
    }

    #[test]
    fn validate_rejects_zero_step_and_negative_tolerance() {
        let mut cfg = EngineConfig::default();
        cfg.set_rules(
            "tires",
            CategoryRules {
                quantity_rule: QuantityRule::MultipleOf {
                    step: 0,
                    on_blur: BlurAction::Reject,
                },
                ..CategoryRules::default()
            },
        );
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let cfg = EngineConfig {
            tolerance_cents: -1,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
