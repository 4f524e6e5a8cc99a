use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EquityError {
    #[error("Cannot rebalance an empty member set")]
    EmptySubset,

    #[error("Member set holds zero total equity; delta {delta} cannot be split pro-rata")]
    ZeroSubsetTotal { delta: Decimal },

    #[error("Rebalance would leave {member_id} with a negative share ({value})")]
    NegativeShare { member_id: String, value: Decimal },

    #[error("Invalid percentage for {field}: {value} (expected 0-100)")]
    InvalidPercentage { field: String, value: Decimal },

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: String, value: Decimal },

    #[error("Cannot {action} while {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Approver {actual} cannot act on this step (waiting on {expected})")]
    NotCurrentApprover { expected: String, actual: String },

    #[error("Distribution request has no approval steps")]
    NoApprovers,

    #[error("Allocation for fiscal year {fiscal_year} is finalized")]
    AllocationFinalized { fiscal_year: i32 },

    #[error("Unknown member: {0}")]
    UnknownMember(String),

    #[error("Member already registered: {0}")]
    DuplicateMember(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EquityError>;

/// Reject percentages outside 0-100.
pub(crate) fn check_percentage(field: &str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(EquityError::InvalidPercentage {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
