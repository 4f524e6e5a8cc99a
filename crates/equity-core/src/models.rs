use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Retired,
    Resigned,
    Terminated,
    Deceased,
    Suspended,
    Probationary,
}

impl MemberStatus {
    /// Only active members hold equity that counts toward allocation statistics.
    pub fn is_active(self) -> bool {
        matches!(self, MemberStatus::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Retired => "retired",
            MemberStatus::Resigned => "resigned",
            MemberStatus::Terminated => "terminated",
            MemberStatus::Deceased => "deceased",
            MemberStatus::Suspended => "suspended",
            MemberStatus::Probationary => "probationary",
        }
    }
}

impl Default for MemberStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemberStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(MemberStatus::Active),
            "retired" => Ok(MemberStatus::Retired),
            "resigned" => Ok(MemberStatus::Resigned),
            "terminated" => Ok(MemberStatus::Terminated),
            "deceased" => Ok(MemberStatus::Deceased),
            "suspended" => Ok(MemberStatus::Suspended),
            "probationary" => Ok(MemberStatus::Probationary),
            other => Err(format!("unknown member status '{}'", other)),
        }
    }
}

/// Equity and status for one member in one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberYearRecord {
    pub fiscal_year: i32,
    /// 0-100
    pub equity_percentage: Decimal,
    pub capital_balance: Decimal,
    pub status: MemberStatus,
    /// 0-100, applied to this member's distributions
    #[serde(default)]
    pub tax_withholding_percentage: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub join_date: Option<NaiveDate>,
    #[serde(default)]
    pub records: BTreeMap<i32, MemberYearRecord>,
}

impl Member {
    pub fn new(id: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            join_date: None,
            records: BTreeMap::new(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn record(&self, fiscal_year: i32) -> Option<&MemberYearRecord> {
        self.records.get(&fiscal_year)
    }
}

/// Flat per-year view of a member, the shape every calculator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEquity {
    pub member_id: String,
    pub name: String,
    pub fiscal_year: i32,
    pub equity_percentage: Decimal,
    pub capital_balance: Decimal,
    pub status: MemberStatus,
    #[serde(default)]
    pub tax_withholding_percentage: Decimal,
}

impl MemberEquity {
    pub fn from_record(member: &Member, record: &MemberYearRecord) -> Self {
        Self {
            member_id: member.id.clone(),
            name: member.display_name(),
            fiscal_year: record.fiscal_year,
            equity_percentage: record.equity_percentage,
            capital_balance: record.capital_balance,
            status: record.status,
            tax_withholding_percentage: record.tax_withholding_percentage,
        }
    }
}

/// Advisory findings surfaced alongside calculation results. None of these
/// stop a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// Active equity sums above 100%.
    OverAllocated { total: Decimal },
    /// Active equity sums below 100%.
    UnderAllocated { total: Decimal },
    /// Computed capital differs from the balance sheet by at least the tolerance.
    ReconciliationVariance { variance: Decimal, tolerance: Decimal },
    /// Cent rounding moved a split total by more than the configured threshold.
    RoundingDrift { drift: Decimal, threshold: Decimal },
}
