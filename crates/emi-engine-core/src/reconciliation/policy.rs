use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EmiEngineError;
use crate::types::Rate;
use crate::EmiEngineResult;

/// Late-payment penalty: a flat share of the installment per day late.
pub const DEFAULT_DAILY_PENALTY_RATE: Rate = dec!(0.002);

/// Overdue penalty settings. Simple, never compounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyPolicy {
    /// Fraction of the installment charged per day past the due date
    /// (0.002 = 0.2% per day).
    #[serde(default = "default_daily_penalty_rate")]
    pub daily_penalty_rate: Rate,
}

fn default_daily_penalty_rate() -> Rate {
    DEFAULT_DAILY_PENALTY_RATE
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        PenaltyPolicy {
            daily_penalty_rate: DEFAULT_DAILY_PENALTY_RATE,
        }
    }
}

impl PenaltyPolicy {
    pub fn validate(&self) -> EmiEngineResult<()> {
        if self.daily_penalty_rate < Decimal::ZERO {
            return Err(EmiEngineError::invalid(
                "daily_penalty_rate",
                "Penalty rate cannot be negative.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate() {
        assert_eq!(PenaltyPolicy::default().daily_penalty_rate, dec!(0.002));
    }

    #[test]
    fn test_empty_object_deserialises_to_default() {
        let p: PenaltyPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(p, PenaltyPolicy::default());
    }

    #[test]
    fn test_negative_rate_rejected() {
        let p = PenaltyPolicy {
            daily_penalty_rate: dec!(-0.001),
        };
        assert!(p.validate().is_err());
    }
}
