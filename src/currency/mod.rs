//! Money rendering for notification messages and terminal output.

use serde::{Deserialize, Serialize};

/// ISO 4217 currency code, stored upper-cased.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String")]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn symbol(&self) -> &str {
        match self.as_str() {
            "USD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "JPY" => "¥",
            "INR" => "₹",
            "AUD" => "A$",
            other => other,
        }
    }

    pub fn minor_units(&self) -> usize {
        match self.as_str() {
            "JPY" => 0,
            "KWD" | "BHD" => 3,
            _ => 2,
        }
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("USD")
    }
}

/// Separators used when rendering numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocaleConfig {
    pub language_tag: String,
    pub decimal_separator: char,
    pub grouping_separator: char,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language_tag: "en-US".into(),
            decimal_separator: '.',
            grouping_separator: ',',
        }
    }
}

/// Formats amounts as `<symbol><grouped digits>` for one currency and locale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoneyFormat {
    pub currency: CurrencyCode,
    pub locale: LocaleConfig,
}

impl MoneyFormat {
    pub fn new(currency: CurrencyCode, locale: LocaleConfig) -> Self {
        Self { currency, locale }
    }

    pub fn format(&self, amount: f64) -> String {
        let body = format_number(&self.locale, amount.abs(), self.currency.minor_units());
        let sign = if amount < 0.0 { "-" } else { "" };
        format!("{sign}{}{body}", self.currency.symbol())
    }
}

/// Renders `value` with `precision` decimals and the locale's separators.
pub fn format_number(locale: &LocaleConfig, value: f64, precision: usize) -> String {
    let raw = format!("{:.*}", precision, value);
    let (int_part, fraction) = match raw.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (raw.as_str(), None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };
    let mut out = String::with_capacity(raw.len() + digits.len() / 3);
    out.push_str(sign);
    out.push_str(&group_digits(digits, locale.grouping_separator));
    if let Some(fraction) = fraction {
        out.push(locale.decimal_separator);
        out.push_str(fraction);
    }
    out
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx != 0 && (len - idx) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}
