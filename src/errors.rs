use std::result::Result as StdResult;

use thiserror::Error;

/// Failures reported by the ledger's mutating operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
    #[error("Insufficient funds: requested {requested:.2}, available {available:.2}")]
    InsufficientFunds { requested: f64, available: f64 },
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Cannot transfer from account {0} to itself")]
    SameAccountTransfer(String),
    #[error("No account numbers left for prefix {0}")]
    AccountNumbersExhausted(String),
}

pub type Result<T> = StdResult<T, LedgerError>;

/// Errors raised while reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl LedgerError {
    /// Short, stable label for the failure kind, used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::InsufficientFunds { .. } => "insufficient_funds",
            LedgerError::AccountNotFound(_) => "account_not_found",
            LedgerError::SameAccountTransfer(_) => "same_account_transfer",
            LedgerError::AccountNumbersExhausted(_) => "account_numbers_exhausted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_funds_message_shows_both_amounts() {
        let err = LedgerError::InsufficientFunds {
            requested: 5300.0,
            available: 5200.0,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 5300.00, available 5200.00"
        );
        assert_eq!(err.kind(), "insufficient_funds");
    }
}
