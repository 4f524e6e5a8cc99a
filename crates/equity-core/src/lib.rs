//! Member Equity Core
//!
//! Equity allocation, capital rollforward, concentration statistics,
//! balance-sheet reconciliation, distribution splits and the distribution
//! request approval chain for a member-owned company. All money and
//! percentage math is done in `Decimal`.

pub mod allocation;
pub mod approval;
pub mod config;
pub mod distribution;
pub mod equity_calculator;
pub mod error;
pub mod models;
pub mod rebalancing;
pub mod reconciliation;
pub mod registry;
pub mod shared_math;
#[cfg(test)]
mod tests;

pub use allocation::{
    balance_incentive_rate, close_year, EquityAllocation, YearEndClose, YearEndInput,
    YearEndMemberInput,
};
pub use approval::{ApprovalStep, DistributionRequest, RequestStatus, StatusChange, StepStatus};
pub use config::{CalculationSettings, RemainderPolicy};
pub use distribution::{
    Distribution, DistributionBreakdown, DistributionEngine, DistributionShare,
    DistributionStatus, MemberDistribution,
};
pub use equity_calculator::{EquityCalculator, EquitySummary};
pub use error::{EquityError, Result};
pub use models::*;
pub use rebalancing::{EquityHolding, ProRataRebalancer, RebalanceResult, RebalancedShare};
pub use reconciliation::{ReconciliationResult, ReconciliationStatus, Reconciler};
pub use registry::MemberRegistry;
