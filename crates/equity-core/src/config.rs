use crate::error::{EquityError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// What to do with the cents lost or gained when a split is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Leave amounts as rounded and report the drift.
    Report,
    /// Truncate to cents, then hand leftover cents to the largest fractional
    /// remainders so the split sums exactly to the rounded total.
    LargestRemainder,
}

impl Default for RemainderPolicy {
    fn default() -> Self {
        Self::Report
    }
}

impl std::str::FromStr for RemainderPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "report" => Ok(Self::Report),
            "largest_remainder" | "largest" => Ok(Self::LargestRemainder),
            other => Err(format!("unknown remainder policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationSettings {
    /// Capital reconciles while |computed - balance sheet| stays below this.
    pub reconciliation_tolerance: Decimal,
    /// Largest acceptable cent drift in a rounded split before a warning.
    pub rounding_drift_threshold: Decimal,
    /// Percentage points added to SOFR for the balance incentive.
    pub incentive_spread_percent: Decimal,
    /// Ceiling on the balance incentive rate, in percent.
    pub incentive_cap_percent: Decimal,
    /// How far active equity may stray from 100 before it is flagged.
    pub equity_total_tolerance: Decimal,
    pub remainder_policy: RemainderPolicy,
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            reconciliation_tolerance: dec!(10000.00),
            rounding_drift_threshold: dec!(0.01),
            incentive_spread_percent: dec!(5),
            incentive_cap_percent: dec!(10),
            equity_total_tolerance: dec!(0.01),
            remainder_policy: RemainderPolicy::Report,
        }
    }
}

impl CalculationSettings {
    pub fn validate(&self) -> Result<()> {
        if self.reconciliation_tolerance < Decimal::ZERO {
            return Err(EquityError::InvalidConfig(
                "reconciliation_tolerance must be >= 0".to_string(),
            ));
        }
        if self.rounding_drift_threshold < Decimal::ZERO {
            return Err(EquityError::InvalidConfig(
                "rounding_drift_threshold must be >= 0".to_string(),
            ));
        }
        if self.incentive_spread_percent < Decimal::ZERO {
            return Err(EquityError::InvalidConfig(
                "incentive_spread_percent must be >= 0".to_string(),
            ));
        }
        if self.incentive_cap_percent < Decimal::ZERO
            || self.incentive_cap_percent > Decimal::ONE_HUNDRED
        {
            return Err(EquityError::InvalidConfig(
                "incentive_cap_percent must be between 0 and 100".to_string(),
            ));
        }
        if self.equity_total_tolerance < Decimal::ZERO {
            return Err(EquityError::InvalidConfig(
                "equity_total_tolerance must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}
