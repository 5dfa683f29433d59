//! Raw-digit currency entry: the buffer a user types, where the last two
//! digits are always cents.

use expense_domain::{
    format::{format_number, LocaleConfig},
    Money,
};

/// Longest digit buffer the editing helpers let a user type.
const MAX_TYPED_DIGITS: usize = 15;

/// Converts between typed digit buffers and [`Money`]. Never fails; anything
/// unparsable reads as zero.
pub struct CurrencyInputCodec;

impl CurrencyInputCodec {
    /// `"123456"` becomes 1234.56. Separators and symbols are ignored; a `-`
    /// before the first digit makes the value negative.
    pub fn digits_to_value(digits: &str) -> Money {
        let (negative, cleaned) = Self::split_sign(digits);
        if cleaned.is_empty() {
            return Money::ZERO;
        }
        let signed = if negative {
            format!("-{}", cleaned)
        } else {
            cleaned
        };
        signed
            .parse::<i64>()
            .map(Money::from_cents)
            .unwrap_or(Money::ZERO)
    }

    /// 1234.56 becomes `"123456"`, -0.05 becomes `"-5"`.
    pub fn value_to_digits(value: Money) -> String {
        value.cents().to_string()
    }

    /// Appends a typed character; non-digits are ignored.
    pub fn push_digit(buffer: &str, ch: char) -> String {
        let (negative, mut cleaned) = Self::split_sign(buffer);
        if ch.is_ascii_digit() && cleaned.len() < MAX_TYPED_DIGITS {
            cleaned.push(ch);
        }
        Self::rebuild(negative, &cleaned)
    }

    /// Removes the last typed digit.
    pub fn pop_digit(buffer: &str) -> String {
        let (negative, mut cleaned) = Self::split_sign(buffer);
        cleaned.pop();
        Self::rebuild(negative, &cleaned)
    }

    /// Renders a digit buffer the way the input field shows it, e.g. `1.234,56`.
    pub fn format_for_display(buffer: &str, locale: &LocaleConfig) -> String {
        format_number(locale, Self::digits_to_value(buffer))
    }

    fn rebuild(negative: bool, digits: &str) -> String {
        let value = Self::digits_to_value(digits);
        Self::value_to_digits(if negative { -value } else { value })
    }

    fn split_sign(buffer: &str) -> (bool, String) {
        let negative = buffer
            .chars()
            .find(|ch| *ch == '-' || ch.is_ascii_digit())
            == Some('-');
        let digits = buffer.chars().filter(char::is_ascii_digit).collect();
        (negative, digits)
    }
}
