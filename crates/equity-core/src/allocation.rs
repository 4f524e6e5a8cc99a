//! Year-end capital allocation.
//!
//! Each member first earns a balance incentive on their beginning capital at
//! `min(SOFR + spread, cap)`. Whatever net income remains is allocated by
//! equity percentage, and the capital account rolls forward:
//! `ending = beginning + incentive + equity allocation - distributions`.

use crate::config::{CalculationSettings, RemainderPolicy};
use crate::equity_calculator::EquityCalculator;
use crate::error::{check_percentage, EquityError, Result};
use crate::models::*;
use crate::shared_math::{largest_remainder, percent_of, round_cents};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearEndMemberInput {
    pub member_id: String,
    pub equity_percentage: Decimal,
    pub beginning_capital: Decimal,
    /// Distributions already paid during the year.
    #[serde(default)]
    pub distributions: Decimal,
}

impl YearEndMemberInput {
    /// Active members, with their current capital balance as the beginning balance.
    pub fn from_members(members: &[MemberEquity]) -> Vec<Self> {
        members
            .iter()
            .filter(|m| m.status.is_active())
            .map(|m| Self {
                member_id: m.member_id.clone(),
                equity_percentage: m.equity_percentage,
                beginning_capital: m.capital_balance,
                distributions: Decimal::ZERO,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearEndInput {
    pub fiscal_year: i32,
    /// SOFR for the year, in percent.
    pub sofr_rate: Decimal,
    /// Net income available for allocation.
    pub net_income: Decimal,
    pub members: Vec<YearEndMemberInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityAllocation {
    pub member_id: String,
    pub fiscal_year: i32,
    pub equity_percentage: Decimal,
    pub beginning_capital_balance: Decimal,
    pub balance_incentive_rate: Decimal,
    pub balance_incentive_return: Decimal,
    pub equity_based_allocation: Decimal,
    pub distributions: Decimal,
    pub ending_capital_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearEndClose {
    pub fiscal_year: i32,
    pub balance_incentive_rate: Decimal,
    pub net_income: Decimal,
    pub total_balance_incentive: Decimal,
    /// Net income left after incentives; negative when incentives exceed income.
    pub equity_pool: Decimal,
    pub rounding_drift: Decimal,
    pub allocations: Vec<EquityAllocation>,
    pub warnings: Vec<DataQualityWarning>,
    finalized: bool,
}

/// `min(sofr + spread, cap)`, never below zero. Percent in, percent out.
pub fn balance_incentive_rate(sofr_rate: Decimal, settings: &CalculationSettings) -> Decimal {
    (sofr_rate + settings.incentive_spread_percent)
        .min(settings.incentive_cap_percent)
        .max(Decimal::ZERO)
}

pub fn close_year(input: &YearEndInput, settings: &CalculationSettings) -> Result<YearEndClose> {
    for m in &input.members {
        check_percentage("equity_percentage", m.equity_percentage)?;
        if m.distributions < Decimal::ZERO {
            return Err(EquityError::InvalidAmount {
                field: format!("distributions[{}]", m.member_id),
                value: m.distributions,
            });
        }
    }

    let rate = balance_incentive_rate(input.sofr_rate, settings);

    let incentives: Vec<Decimal> = input
        .members
        .iter()
        .map(|m| round_cents(percent_of(m.beginning_capital.max(Decimal::ZERO), rate)))
        .collect();
    let total_incentive: Decimal = incentives.iter().sum();
    let equity_pool = input.net_income - total_incentive;

    let equity_total: Decimal = input.members.iter().map(|m| m.equity_percentage).sum();
    let expected = round_cents(percent_of(equity_pool, equity_total));
    let raw: Vec<Decimal> = input
        .members
        .iter()
        .map(|m| percent_of(equity_pool, m.equity_percentage))
        .collect();

    let (equity_shares, rounding_drift) = match settings.remainder_policy {
        RemainderPolicy::Report => {
            let rounded: Vec<Decimal> = raw.iter().map(|r| round_cents(*r)).collect();
            let drift = expected - rounded.iter().sum::<Decimal>();
            (rounded, drift)
        }
        RemainderPolicy::LargestRemainder => (largest_remainder(&raw, expected), Decimal::ZERO),
    };

    let mut warnings =
        EquityCalculator::allocation_warnings(input.members.len(), equity_total, settings);
    if rounding_drift.abs() > settings.rounding_drift_threshold {
        tracing::warn!(
            "Year-end {} equity pool drifts {} after rounding",
            input.fiscal_year,
            rounding_drift
        );
        warnings.push(DataQualityWarning::RoundingDrift {
            drift: rounding_drift,
            threshold: settings.rounding_drift_threshold,
        });
    }

    let allocations = input
        .members
        .iter()
        .zip(incentives)
        .zip(equity_shares)
        .map(|((m, incentive), equity_share)| EquityAllocation {
            member_id: m.member_id.clone(),
            fiscal_year: input.fiscal_year,
            equity_percentage: m.equity_percentage,
            beginning_capital_balance: m.beginning_capital,
            balance_incentive_rate: rate,
            balance_incentive_return: incentive,
            equity_based_allocation: equity_share,
            distributions: m.distributions,
            ending_capital_balance: m.beginning_capital + incentive + equity_share
                - m.distributions,
        })
        .collect();

    tracing::info!(
        "Closed fiscal year {}: incentive rate {}%, incentives {}, equity pool {}",
        input.fiscal_year,
        rate,
        total_incentive,
        equity_pool
    );

    Ok(YearEndClose {
        fiscal_year: input.fiscal_year,
        balance_incentive_rate: rate,
        net_income: input.net_income,
        total_balance_incentive: total_incentive,
        equity_pool,
        rounding_drift,
        allocations,
        warnings,
        finalized: false,
    })
}

impl YearEndClose {
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Lock the close. Later mutations fail with `AllocationFinalized`.
    pub fn finalize(&mut self) {
        if !self.finalized {
            tracing::info!("Finalized year-end allocation for {}", self.fiscal_year);
            self.finalized = true;
        }
    }

    /// Record a distribution paid after the close was computed and roll the
    /// member's ending balance forward.
    pub fn record_distribution(&mut self, member_id: &str, amount: Decimal) -> Result<()> {
        if self.finalized {
            return Err(EquityError::AllocationFinalized {
                fiscal_year: self.fiscal_year,
            });
        }
        if amount <= Decimal::ZERO {
            return Err(EquityError::InvalidAmount {
                field: "distribution".to_string(),
                value: amount,
            });
        }
        let row = self
            .allocations
            .iter_mut()
            .find(|a| a.member_id == member_id)
            .ok_or_else(|| EquityError::UnknownMember(member_id.to_string()))?;
        row.distributions += amount;
        row.ending_capital_balance -= amount;
        Ok(())
    }

    pub fn total_beginning_capital(&self) -> Decimal {
        self.allocations.iter().map(|a| a.beginning_capital_balance).sum()
    }

    pub fn total_ending_capital(&self) -> Decimal {
        self.allocations.iter().map(|a| a.ending_capital_balance).sum()
    }

    pub fn total_distributions(&self) -> Decimal {
        self.allocations.iter().map(|a| a.distributions).sum()
    }
}
