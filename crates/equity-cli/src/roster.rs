use anyhow::{Context, Result};
use equity_core::{MemberEquity, MemberStatus};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

/// Parse a member roster.
/// Expected columns: member_id, name, equity_percentage, capital_balance,
/// status, fiscal_year, tax_withholding_percentage (optional)
pub fn parse_roster(csv_data: &str) -> Result<Vec<MemberEquity>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let mut members = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let member_id = record.get(0).unwrap_or("").trim().to_string();
        if member_id.is_empty() {
            tracing::warn!("Skipping roster row {}: blank member_id", line + 2);
            continue;
        }

        let equity = record.get(2).and_then(|s| Decimal::from_str(s.trim()).ok());
        let capital = record.get(3).and_then(|s| Decimal::from_str(s.trim()).ok());
        let status = record.get(4).and_then(|s| MemberStatus::from_str(s).ok());
        let fiscal_year = record.get(5).and_then(|s| s.trim().parse::<i32>().ok());
        // A missing or blank withholding cell means none withheld.
        let withholding = match record.get(6).map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Decimal::from_str(raw).ok(),
            None => Some(Decimal::ZERO),
        };

        let (
            Some(equity_percentage),
            Some(capital_balance),
            Some(status),
            Some(fiscal_year),
            Some(tax_withholding_percentage),
        ) = (equity, capital, status, fiscal_year, withholding)
        else {
            tracing::warn!("Skipping roster row {} ({}): unparseable fields", line + 2, member_id);
            continue;
        };

        members.push(MemberEquity {
            name: record.get(1).unwrap_or("").trim().to_string(),
            member_id,
            fiscal_year,
            equity_percentage,
            capital_balance,
            status,
            tax_withholding_percentage,
        });
    }

    Ok(members)
}

pub fn load_roster(path: &Path) -> Result<Vec<MemberEquity>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("reading roster {}", path.display()))?;
    let members = parse_roster(&data)?;
    tracing::info!("Loaded {} members from {}", members.len(), path.display());
    Ok(members)
}
