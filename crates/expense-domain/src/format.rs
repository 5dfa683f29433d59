//! Locale-aware rendering of monetary amounts.

use serde::{Deserialize, Serialize};

use crate::money::{Money, CENTS_PER_UNIT};

/// Separator and symbol preferences for rendering amounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocaleConfig {
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub currency_symbol: String,
    #[serde(default)]
    pub negative_style: NegativeStyle,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            decimal_separator: ',',
            grouping_separator: '.',
            currency_symbol: "R$".into(),
            negative_style: NegativeStyle::Sign,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NegativeStyle {
    #[default]
    Sign,
    Parentheses,
}

/// Renders the amount with grouping and decimal separators, without a symbol.
pub fn format_number(locale: &LocaleConfig, value: Money) -> String {
    let cents = value.cents().unsigned_abs();
    let per_unit = CENTS_PER_UNIT as u64;
    let int_part = group_digits(&(cents / per_unit).to_string(), locale.grouping_separator);
    let body = format!(
        "{}{}{:02}",
        int_part,
        locale.decimal_separator,
        cents % per_unit
    );
    if value.is_negative() {
        match locale.negative_style {
            NegativeStyle::Sign => format!("-{}", body),
            NegativeStyle::Parentheses => format!("({})", body),
        }
    } else {
        body
    }
}

/// Renders the amount prefixed by the locale's currency symbol.
pub fn format_money(locale: &LocaleConfig, value: Money) -> String {
    format!("{} {}", locale.currency_symbol, format_number(locale, value))
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_default_locale() {
        let locale = LocaleConfig::default();
        assert_eq!(format_money(&locale, Money::from_cents(123456789)), "R$ 1.234.567,89");
        assert_eq!(format_number(&locale, Money::from_cents(5)), "0,05");
    }

    #[test]
    fn formats_negative_values_per_style() {
        let mut locale = LocaleConfig {
            decimal_separator: '.',
            grouping_separator: ',',
            currency_symbol: "$".into(),
            negative_style: NegativeStyle::Parentheses,
        };
        assert_eq!(format_number(&locale, Money::from_cents(-123450)), "(1,234.50)");
        locale.negative_style = NegativeStyle::Sign;
        assert_eq!(format_number(&locale, Money::from_cents(-123450)), "-1,234.50");
    }
}
