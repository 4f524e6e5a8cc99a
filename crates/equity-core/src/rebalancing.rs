use crate::error::{check_percentage, EquityError, Result};
use crate::models::*;
use crate::shared_math::index_of_largest;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Decimal places kept on rebalanced percentages.
const PERCENT_DP: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityHolding {
    pub member_id: String,
    pub equity_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalancedShare {
    pub member_id: String,
    pub old_percentage: Decimal,
    pub new_percentage: Decimal,
    pub change: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceResult {
    pub delta: Decimal,
    pub old_total: Decimal,
    pub new_total: Decimal,
    pub shares: Vec<RebalancedShare>,
}

pub struct ProRataRebalancer;

impl ProRataRebalancer {
    /// Spread `delta` percentage points across `holdings` in proportion to
    /// each holder's current share: `new = old + delta * old / sum(old)`.
    ///
    /// New percentages are rounded to six places and the rounding residual is
    /// given to the largest holder, so the new total is exactly
    /// `sum(old) + delta`.
    pub fn rebalance(holdings: &[EquityHolding], delta: Decimal) -> Result<RebalanceResult> {
        if holdings.is_empty() {
            return Err(EquityError::EmptySubset);
        }
        for holding in holdings {
            check_percentage(
                &format!("equity_percentage of {}", holding.member_id),
                holding.equity_percentage,
            )?;
        }
        let old_total: Decimal = holdings.iter().map(|h| h.equity_percentage).sum();
        if old_total.is_zero() {
            return Err(EquityError::ZeroSubsetTotal { delta });
        }

        let mut new_percentages: Vec<Decimal> = holdings
            .iter()
            .map(|h| {
                let adjusted = h.equity_percentage + delta * h.equity_percentage / old_total;
                adjusted.round_dp_with_strategy(PERCENT_DP, RoundingStrategy::MidpointAwayFromZero)
            })
            .collect();

        let target_total = old_total + delta;
        let residual = target_total - new_percentages.iter().sum::<Decimal>();
        if !residual.is_zero() {
            let old: Vec<Decimal> = holdings.iter().map(|h| h.equity_percentage).collect();
            if let Some(idx) = index_of_largest(&old) {
                new_percentages[idx] += residual;
            }
        }

        let mut shares = Vec::with_capacity(holdings.len());
        for (holding, new_pct) in holdings.iter().zip(new_percentages) {
            if new_pct < Decimal::ZERO {
                return Err(EquityError::NegativeShare {
                    member_id: holding.member_id.clone(),
                    value: new_pct,
                });
            }
            check_percentage(&format!("new equity_percentage of {}", holding.member_id), new_pct)?;
            shares.push(RebalancedShare {
                member_id: holding.member_id.clone(),
                old_percentage: holding.equity_percentage,
                new_percentage: new_pct,
                change: new_pct - holding.equity_percentage,
            });
        }

        tracing::debug!(
            "Rebalanced {} holders by {} points ({} -> {})",
            shares.len(),
            delta,
            old_total,
            target_total
        );

        Ok(RebalanceResult {
            delta,
            old_total,
            new_total: target_total,
            shares,
        })
    }

    /// Rebalance the named members out of a roster snapshot.
    pub fn rebalance_members(
        members: &[MemberEquity],
        member_ids: &[String],
        delta: Decimal,
    ) -> Result<RebalanceResult> {
        let holdings = member_ids
            .iter()
            .map(|id| {
                members
                    .iter()
                    .find(|m| &m.member_id == id)
                    .map(|m| EquityHolding {
                        member_id: m.member_id.clone(),
                        equity_percentage: m.equity_percentage,
                    })
                    .ok_or_else(|| EquityError::UnknownMember(id.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::rebalance(&holdings, delta)
    }
}
