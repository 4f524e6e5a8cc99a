use crate::models::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    Reconciled,
    VarianceExceeded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub computed_total: Decimal,
    pub external_total: Decimal,
    pub variance: Decimal,
    pub tolerance: Decimal,
    pub reconciled: bool,
    pub status: ReconciliationStatus,
    pub warnings: Vec<DataQualityWarning>,
}

pub struct Reconciler;

impl Reconciler {
    /// Compare a computed capital total against the balance sheet.
    /// Reconciled only while the variance is strictly below `tolerance`.
    pub fn reconcile(computed: Decimal, external: Decimal, tolerance: Decimal) -> ReconciliationResult {
        let variance = (computed - external).abs();
        let reconciled = variance < tolerance;

        let mut warnings = Vec::new();
        let status = if reconciled {
            ReconciliationStatus::Reconciled
        } else {
            tracing::warn!(
                "Capital does not reconcile: computed {} vs balance sheet {} (variance {}, tolerance {})",
                computed,
                external,
                variance,
                tolerance
            );
            warnings.push(DataQualityWarning::ReconciliationVariance { variance, tolerance });
            ReconciliationStatus::VarianceExceeded
        };

        ReconciliationResult {
            computed_total: computed,
            external_total: external,
            variance,
            tolerance,
            reconciled,
            status,
            warnings,
        }
    }

    /// Sum active members' capital and reconcile it against the balance sheet.
    pub fn reconcile_capital(
        members: &[MemberEquity],
        external: Decimal,
        tolerance: Decimal,
    ) -> ReconciliationResult {
        let computed: Decimal = members
            .iter()
            .filter(|m| m.status.is_active())
            .map(|m| m.capital_balance)
            .sum();
        Self::reconcile(computed, external, tolerance)
    }
}
