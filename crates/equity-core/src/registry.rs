use crate::error::{check_percentage, EquityError, Result};
use crate::models::*;
use std::collections::BTreeMap;

/// In-memory member roster with per-fiscal-year equity records.
#[derive(Debug, Clone, Default)]
pub struct MemberRegistry {
    members: BTreeMap<String, Member>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&mut self, member: Member) -> Result<()> {
        if self.members.contains_key(&member.id) {
            return Err(EquityError::DuplicateMember(member.id));
        }
        tracing::debug!("Registered member {}", member.id);
        self.members.insert(member.id.clone(), member);
        Ok(())
    }

    /// Insert or replace the member's record for `record.fiscal_year`.
    pub fn record_year(&mut self, member_id: &str, record: MemberYearRecord) -> Result<()> {
        check_percentage("equity_percentage", record.equity_percentage)?;
        check_percentage("tax_withholding_percentage", record.tax_withholding_percentage)?;

        let member = self
            .members
            .get_mut(member_id)
            .ok_or_else(|| EquityError::UnknownMember(member_id.to_string()))?;
        member.records.insert(record.fiscal_year, record);
        Ok(())
    }

    pub fn set_status(
        &mut self,
        member_id: &str,
        fiscal_year: i32,
        status: MemberStatus,
    ) -> Result<()> {
        let member = self
            .members
            .get_mut(member_id)
            .ok_or_else(|| EquityError::UnknownMember(member_id.to_string()))?;
        let record = member
            .records
            .get_mut(&fiscal_year)
            .ok_or_else(|| EquityError::UnknownMember(format!("{} ({})", member_id, fiscal_year)))?;
        if record.status != status {
            tracing::info!(
                "Member {} status for {}: {} -> {}",
                member_id,
                fiscal_year,
                record.status,
                status
            );
        }
        record.status = status;
        Ok(())
    }

    pub fn get(&self, member_id: &str) -> Option<&Member> {
        self.members.get(member_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Every member holding a record for the fiscal year, ordered by id.
    pub fn snapshot(&self, fiscal_year: i32) -> Vec<MemberEquity> {
        self.members
            .values()
            .filter_map(|m| m.record(fiscal_year).map(|r| MemberEquity::from_record(m, r)))
            .collect()
    }

    pub fn active_members(&self, fiscal_year: i32) -> Vec<MemberEquity> {
        self.snapshot(fiscal_year)
            .into_iter()
            .filter(|m| m.status.is_active())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(year: i32, equity: Decimal, status: MemberStatus) -> MemberYearRecord {
        MemberYearRecord {
            fiscal_year: year,
            equity_percentage: equity,
            capital_balance: dec!(1000),
            status,
            tax_withholding_percentage: dec!(25),
        }
    }

    fn registry() -> MemberRegistry {
        let mut reg = MemberRegistry::new();
        reg.add_member(Member::new("M2", "Bea", "Stone")).unwrap();
        reg.add_member(Member::new("M1", "Al", "Brick")).unwrap();
        reg.record_year("M1", record(2024, dec!(60), MemberStatus::Active)).unwrap();
        reg.record_year("M2", record(2024, dec!(40), MemberStatus::Retired)).unwrap();
        reg.record_year("M1", record(2025, dec!(100), MemberStatus::Active)).unwrap();
        reg
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let mut reg = registry();
        let err = reg.add_member(Member::new("M1", "Al", "Brick")).unwrap_err();
        assert_eq!(err, EquityError::DuplicateMember("M1".to_string()));
    }

    #[test]
    fn test_record_unknown_member() {
        let mut reg = registry();
        let err = reg
            .record_year("M9", record(2024, dec!(10), MemberStatus::Active))
            .unwrap_err();
        assert!(matches!(err, EquityError::UnknownMember(_)));
    }

    #[test]
    fn test_record_rejects_out_of_range_equity() {
        let mut reg = registry();
        let err = reg
            .record_year("M1", record(2024, dec!(100.5), MemberStatus::Active))
            .unwrap_err();
        assert!(matches!(err, EquityError::InvalidPercentage { .. }));
    }

    #[test]
    fn test_snapshot_ordered_by_id_and_year_scoped() {
        let reg = registry();
        let snap = reg.snapshot(2024);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].member_id, "M1");
        assert_eq!(snap[0].name, "Al Brick");
        assert_eq!(reg.snapshot(2025).len(), 1);
        assert!(reg.snapshot(2023).is_empty());
    }

    #[test]
    fn test_active_members_filters_status() {
        let reg = registry();
        let active = reg.active_members(2024);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].member_id, "M1");
    }

    #[test]
    fn test_set_status() {
        let mut reg = registry();
        reg.set_status("M2", 2024, MemberStatus::Active).unwrap();
        assert_eq!(reg.active_members(2024).len(), 2);
        assert!(reg.set_status("M2", 2025, MemberStatus::Active).is_err());
    }
}
