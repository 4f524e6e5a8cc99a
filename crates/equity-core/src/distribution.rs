use crate::config::{CalculationSettings, RemainderPolicy};
use crate::equity_calculator::EquityCalculator;
use crate::error::{check_percentage, EquityError, Result};
use crate::models::*;
use crate::shared_math::{largest_remainder, percent_of, round_cents};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One member's claim on a distribution pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionShare {
    pub member_id: String,
    pub equity_percentage: Decimal,
    pub tax_withholding_percentage: Decimal,
}

impl DistributionShare {
    /// Shares for the active members. `withholding_override` replaces each
    /// member's own withholding rate when given.
    pub fn from_members(members: &[MemberEquity], withholding_override: Option<Decimal>) -> Vec<Self> {
        members
            .iter()
            .filter(|m| m.status.is_active())
            .map(|m| Self {
                member_id: m.member_id.clone(),
                equity_percentage: m.equity_percentage,
                tax_withholding_percentage: withholding_override
                    .unwrap_or(m.tax_withholding_percentage),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDistribution {
    pub member_id: String,
    pub equity_percentage: Decimal,
    pub tax_withholding_percentage: Decimal,
    pub gross_amount: Decimal,
    pub tax_withholding: Decimal,
    pub net_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionBreakdown {
    pub total_amount: Decimal,
    pub total_gross: Decimal,
    pub total_tax_withholding: Decimal,
    pub total_net: Decimal,
    /// Rounded pool share minus the sum of per-member gross amounts rounded
    /// independently. Zero after a largest-remainder split.
    pub rounding_drift: Decimal,
    pub lines: Vec<MemberDistribution>,
    pub warnings: Vec<DataQualityWarning>,
}

pub struct DistributionEngine;

impl DistributionEngine {
    /// Split `total` across `shares` by equity percentage, then withhold tax
    /// from each gross amount. All amounts are in cents.
    pub fn calculate(
        total: Decimal,
        shares: &[DistributionShare],
        settings: &CalculationSettings,
    ) -> Result<DistributionBreakdown> {
        if total < Decimal::ZERO {
            return Err(EquityError::InvalidAmount {
                field: "total_amount".to_string(),
                value: total,
            });
        }
        for share in shares {
            check_percentage("equity_percentage", share.equity_percentage)?;
            check_percentage("tax_withholding_percentage", share.tax_withholding_percentage)?;
        }

        let equity_total: Decimal = shares.iter().map(|s| s.equity_percentage).sum();
        let expected_gross = round_cents(percent_of(total, equity_total));

        let raw_gross: Vec<Decimal> = shares
            .iter()
            .map(|s| percent_of(total, s.equity_percentage))
            .collect();
        let rounded_gross: Vec<Decimal> = raw_gross.iter().map(|g| round_cents(*g)).collect();
        let naive_drift = expected_gross - rounded_gross.iter().sum::<Decimal>();

        let (gross_amounts, rounding_drift) = match settings.remainder_policy {
            RemainderPolicy::Report => (rounded_gross, naive_drift),
            RemainderPolicy::LargestRemainder => {
                (largest_remainder(&raw_gross, expected_gross), Decimal::ZERO)
            }
        };

        let mut warnings =
            EquityCalculator::allocation_warnings(shares.len(), equity_total, settings);
        if rounding_drift.abs() > settings.rounding_drift_threshold {
            tracing::warn!(
                "Distribution of {} drifts {} after cent rounding (threshold {})",
                total,
                rounding_drift,
                settings.rounding_drift_threshold
            );
            warnings.push(DataQualityWarning::RoundingDrift {
                drift: rounding_drift,
                threshold: settings.rounding_drift_threshold,
            });
        }

        let lines: Vec<MemberDistribution> = shares
            .iter()
            .zip(gross_amounts)
            .map(|(share, gross)| {
                let withholding = round_cents(percent_of(gross, share.tax_withholding_percentage));
                MemberDistribution {
                    member_id: share.member_id.clone(),
                    equity_percentage: share.equity_percentage,
                    tax_withholding_percentage: share.tax_withholding_percentage,
                    gross_amount: gross,
                    tax_withholding: withholding,
                    net_amount: gross - withholding,
                }
            })
            .collect();

        let total_gross: Decimal = lines.iter().map(|l| l.gross_amount).sum();
        let total_tax_withholding: Decimal = lines.iter().map(|l| l.tax_withholding).sum();
        let total_net: Decimal = lines.iter().map(|l| l.net_amount).sum();

        tracing::debug!(
            "Distributed {} across {} members (gross {}, withheld {})",
            total,
            lines.len(),
            total_gross,
            total_tax_withholding
        );

        Ok(DistributionBreakdown {
            total_amount: total,
            total_gross,
            total_tax_withholding,
            total_net,
            rounding_drift,
            lines,
            warnings,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    Draft,
    Approved,
    Processing,
    Completed,
}

impl std::fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DistributionStatus::Draft => "draft",
            DistributionStatus::Approved => "approved",
            DistributionStatus::Processing => "processing",
            DistributionStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A computed distribution moving through draft -> approved -> processing -> completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    pub id: String,
    pub fiscal_year: i32,
    pub status: DistributionStatus,
    pub breakdown: DistributionBreakdown,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Distribution {
    pub fn new(id: impl Into<String>, fiscal_year: i32, breakdown: DistributionBreakdown) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            fiscal_year,
            status: DistributionStatus::Draft,
            breakdown,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn approve(&mut self) -> Result<()> {
        self.advance(DistributionStatus::Draft, DistributionStatus::Approved, "approve")
    }

    pub fn start_processing(&mut self) -> Result<()> {
        self.advance(
            DistributionStatus::Approved,
            DistributionStatus::Processing,
            "start processing",
        )
    }

    pub fn complete(&mut self) -> Result<()> {
        self.advance(
            DistributionStatus::Processing,
            DistributionStatus::Completed,
            "complete",
        )
    }

    fn advance(
        &mut self,
        expected: DistributionStatus,
        next: DistributionStatus,
        action: &str,
    ) -> Result<()> {
        if self.status != expected {
            return Err(EquityError::InvalidTransition {
                from: self.status.to_string(),
                action: action.to_string(),
            });
        }
        tracing::info!("Distribution {}: {} -> {}", self.id, self.status, next);
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
