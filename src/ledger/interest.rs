use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account classification; fixes the interest policy at account creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountCategory {
    Savings,
    Checking,
    Fixed,
}

impl AccountCategory {
    pub const ALL: [AccountCategory; 3] = [
        AccountCategory::Savings,
        AccountCategory::Checking,
        AccountCategory::Fixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Savings => "savings",
            AccountCategory::Checking => "checking",
            AccountCategory::Fixed => "fixed",
        }
    }

    pub fn policy(&self) -> InterestPolicy {
        InterestPolicy::for_category(*self)
    }

    /// Total lookup: anything unrecognised maps to checking.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or(AccountCategory::Checking)
    }
}

impl fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "savings" => Ok(AccountCategory::Savings),
            "checking" => Ok(AccountCategory::Checking),
            "fixed" | "fixed-deposit" | "fixed_deposit" => Ok(AccountCategory::Fixed),
            other => Err(format!("unknown account category `{other}`")),
        }
    }
}

/// Simple-interest schedule for one account category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterestPolicy {
    Savings,
    FixedDeposit,
    Checking,
}

impl InterestPolicy {
    pub fn for_category(category: AccountCategory) -> Self {
        match category {
            AccountCategory::Savings => InterestPolicy::Savings,
            AccountCategory::Fixed => InterestPolicy::FixedDeposit,
            AccountCategory::Checking => InterestPolicy::Checking,
        }
    }

    /// Annual rate in percent.
    pub fn rate(&self) -> f64 {
        match self {
            InterestPolicy::Savings => 2.5,
            InterestPolicy::FixedDeposit => 4.5,
            InterestPolicy::Checking => 0.0,
        }
    }

    pub fn interest(&self, balance: f64, years: f64) -> f64 {
        balance * (self.rate() / 100.0) * years
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn savings_earns_two_and_a_half_percent() {
        assert_close(AccountCategory::Savings.policy().interest(1000.0, 1.0), 25.0);
    }

    #[test]
    fn checking_earns_nothing() {
        assert_close(AccountCategory::Checking.policy().interest(1000.0, 1.0), 0.0);
    }

    #[test]
    fn fixed_deposit_scales_with_years() {
        assert_close(AccountCategory::Fixed.policy().interest(1000.0, 2.0), 90.0);
    }

    #[test]
    fn unknown_category_falls_back_to_checking() {
        assert_eq!(
            AccountCategory::parse_lenient("platinum"),
            AccountCategory::Checking
        );
        assert_eq!(
            AccountCategory::parse_lenient(" Fixed-Deposit "),
            AccountCategory::Fixed
        );
    }
}
