use crate::config::CalculationSettings;
use crate::models::*;
use crate::shared_math;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquitySummary {
    pub active_member_count: usize,
    pub total_equity_allocated: Decimal,
    pub average_equity_per_member: Decimal,
    pub total_capital: Decimal,
    /// Fraction (0-1) of allocated equity held by the top 10% of members.
    pub top_10_percent: Decimal,
    /// Fraction (0-1) of allocated equity held by the top 25% of members.
    pub top_25_percent: Decimal,
    pub gini_coefficient: Decimal,
    pub warnings: Vec<DataQualityWarning>,
}

pub struct EquityCalculator;

impl EquityCalculator {
    /// Summarize allocation and concentration over the active members in `members`.
    /// Inactive members are ignored. Empty or zero-equity input yields zeros.
    pub fn summarize(members: &[MemberEquity], settings: &CalculationSettings) -> EquitySummary {
        let active: Vec<&MemberEquity> = members.iter().filter(|m| m.status.is_active()).collect();
        let percentages: Vec<Decimal> = active.iter().map(|m| m.equity_percentage).collect();

        let count = active.len();
        let total: Decimal = percentages.iter().sum();
        let total_capital: Decimal = active.iter().map(|m| m.capital_balance).sum();
        let average = shared_math::safe_ratio(total, Decimal::from(count));

        let warnings = Self::allocation_warnings(count, total, settings);

        tracing::debug!(
            "Equity summary: {} active members, {}% allocated",
            count,
            total
        );

        EquitySummary {
            active_member_count: count,
            total_equity_allocated: total,
            average_equity_per_member: average,
            total_capital: shared_math::round_cents(total_capital),
            top_10_percent: shared_math::top_share(&percentages, 10),
            top_25_percent: shared_math::top_share(&percentages, 25),
            gini_coefficient: shared_math::gini_coefficient(&percentages),
            warnings,
        }
    }

    /// Advisory check that active equity sums to 100.
    pub fn allocation_warnings(
        active_count: usize,
        total: Decimal,
        settings: &CalculationSettings,
    ) -> Vec<DataQualityWarning> {
        let mut warnings = Vec::new();
        if active_count == 0 {
            return warnings;
        }
        let drift = total - Decimal::ONE_HUNDRED;
        if drift > settings.equity_total_tolerance {
            tracing::warn!("Active equity over-allocated: {}%", total);
            warnings.push(DataQualityWarning::OverAllocated { total });
        } else if -drift > settings.equity_total_tolerance {
            tracing::warn!("Active equity under-allocated: {}%", total);
            warnings.push(DataQualityWarning::UnderAllocated { total });
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn member(id: &str, equity: Decimal, capital: Decimal, status: MemberStatus) -> MemberEquity {
        MemberEquity {
            member_id: id.to_string(),
            name: id.to_string(),
            fiscal_year: 2025,
            equity_percentage: equity,
            capital_balance: capital,
            status,
            tax_withholding_percentage: Decimal::ZERO,
        }
    }

    #[test]
    fn test_full_allocation_sums_to_100() {
        let members = vec![
            member("A", dec!(33.3333), dec!(100), MemberStatus::Active),
            member("B", dec!(33.3333), dec!(100), MemberStatus::Active),
            member("C", dec!(33.3334), dec!(100), MemberStatus::Active),
        ];
        let summary = EquityCalculator::summarize(&members, &CalculationSettings::default());
        assert_eq!(summary.total_equity_allocated, dec!(100));
        assert_eq!(summary.active_member_count, 3);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_empty_members_return_zeros() {
        let summary = EquityCalculator::summarize(&[], &CalculationSettings::default());
        assert_eq!(summary.active_member_count, 0);
        assert_eq!(summary.total_equity_allocated, Decimal::ZERO);
        assert_eq!(summary.average_equity_per_member, Decimal::ZERO);
        assert_eq!(summary.top_10_percent, Decimal::ZERO);
        assert_eq!(summary.gini_coefficient, Decimal::ZERO);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_zero_total_equity_returns_zero_ratios() {
        let members = vec![
            member("A", dec!(0), dec!(500), MemberStatus::Active),
            member("B", dec!(0), dec!(500), MemberStatus::Active),
        ];
        let summary = EquityCalculator::summarize(&members, &CalculationSettings::default());
        assert_eq!(summary.top_25_percent, Decimal::ZERO);
        assert_eq!(summary.gini_coefficient, Decimal::ZERO);
        assert_eq!(summary.total_capital, dec!(1000));
        assert_eq!(
            summary.warnings,
            vec![DataQualityWarning::UnderAllocated { total: dec!(0) }]
        );
    }

    #[test]
    fn test_inactive_members_ignored() {
        let members = vec![
            member("A", dec!(60), dec!(600000), MemberStatus::Active),
            member("B", dec!(40), dec!(400000), MemberStatus::Active),
            member("C", dec!(15), dec!(150000), MemberStatus::Retired),
        ];
        let summary = EquityCalculator::summarize(&members, &CalculationSettings::default());
        assert_eq!(summary.active_member_count, 2);
        assert_eq!(summary.total_equity_allocated, dec!(100));
        assert_eq!(summary.average_equity_per_member, dec!(50));
        assert_eq!(summary.total_capital, dec!(1000000));
        // ceil(0.1 * 2) = 1 member: 60 / 100
        assert_eq!(summary.top_10_percent, dec!(0.6));
        assert_eq!(summary.top_25_percent, dec!(0.6));
    }

    #[test]
    fn test_over_allocation_is_warning_not_failure() {
        let members = vec![
            member("A", dec!(70), dec!(1), MemberStatus::Active),
            member("B", dec!(40), dec!(1), MemberStatus::Active),
        ];
        let summary = EquityCalculator::summarize(&members, &CalculationSettings::default());
        assert_eq!(summary.total_equity_allocated, dec!(110));
        assert_eq!(
            summary.warnings,
            vec![DataQualityWarning::OverAllocated { total: dec!(110) }]
        );
    }

    #[test]
    fn test_gini_rises_with_concentration() {
        let settings = CalculationSettings::default();
        let equal: Vec<MemberEquity> = (0..10)
            .map(|i| member(&format!("M{}", i), dec!(10), dec!(1), MemberStatus::Active))
            .collect();
        let mut skewed: Vec<MemberEquity> = (0..9)
            .map(|i| member(&format!("M{}", i), dec!(1), dec!(1), MemberStatus::Active))
            .collect();
        skewed.push(member("BIG", dec!(91), dec!(1), MemberStatus::Active));

        let g_equal = EquityCalculator::summarize(&equal, &settings).gini_coefficient;
        let g_skewed = EquityCalculator::summarize(&skewed, &settings).gini_coefficient;
        assert_eq!(g_equal, Decimal::ZERO);
        assert!(g_skewed > dec!(0.7));
        assert!(g_skewed < Decimal::ONE);
    }
}
