use anyhow::{Context, Result};
use equity_core::{CalculationSettings, RemainderPolicy};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: CalculationSettings,
    /// Default SOFR for year-end closes, in percent.
    pub sofr_rate: Decimal,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = CalculationSettings::default();

        let remainder_policy = match env::var("EQUITY_REMAINDER_POLICY") {
            Ok(raw) => RemainderPolicy::from_str(&raw).map_err(anyhow::Error::msg)?,
            Err(_) => defaults.remainder_policy,
        };

        let settings = CalculationSettings {
            reconciliation_tolerance: decimal_var(
                "EQUITY_RECONCILIATION_TOLERANCE",
                defaults.reconciliation_tolerance,
            )?,
            rounding_drift_threshold: decimal_var(
                "EQUITY_ROUNDING_THRESHOLD",
                defaults.rounding_drift_threshold,
            )?,
            incentive_spread_percent: decimal_var(
                "EQUITY_INCENTIVE_SPREAD",
                defaults.incentive_spread_percent,
            )?,
            incentive_cap_percent: decimal_var("EQUITY_INCENTIVE_CAP", defaults.incentive_cap_percent)?,
            equity_total_tolerance: decimal_var(
                "EQUITY_TOTAL_TOLERANCE",
                defaults.equity_total_tolerance,
            )?,
            remainder_policy,
        };
        settings.validate()?;

        Ok(Self {
            settings,
            sofr_rate: decimal_var("EQUITY_SOFR_RATE", dec!(4.3))?,
        })
    }
}

fn decimal_var(name: &str, default: Decimal) -> Result<Decimal> {
    match env::var(name) {
        Ok(raw) => Decimal::from_str(raw.trim())
            .with_context(|| format!("{} is not a decimal: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}
