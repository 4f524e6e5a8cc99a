//! equity-cli: run member equity calculations over a roster CSV and print JSON.
//!
//! Usage:
//!   equity-cli summary    --members roster.csv [--year 2025]
//!   equity-cli reconcile  --members roster.csv --balance-sheet 1000000 [--tolerance 10000]
//!   equity-cli distribute --members roster.csv --amount 10000 [--withholding 25]
//!   equity-cli rebalance  --members roster.csv --ids A,B --delta -5
//!   equity-cli close      --members roster.csv --net-income 250000 [--sofr 4.3]

mod config;
mod roster;

use anyhow::{bail, Context, Result};
use config::CliConfig;
use equity_core::{
    close_year, CalculationSettings, DistributionEngine, DistributionShare, EquityCalculator, MemberEquity,
    ProRataRebalancer, Reconciler, YearEndInput, YearEndMemberInput,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

const USAGE: &str = "usage: equity-cli <summary|reconcile|distribute|rebalance|close> --members <roster.csv> [options]";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1).map(String::as_str) else {
        bail!(USAGE);
    };

    let config = CliConfig::from_env()?;
    let settings = &config.settings;

    let roster_path = arg_value(&args, "--members")
        .map(PathBuf::from)
        .context(USAGE)?;
    let roster = roster::load_roster(&roster_path)?;
    let year = match arg_value(&args, "--year") {
        Some(raw) => Some(raw.parse::<i32>().with_context(|| format!("bad --year '{}'", raw))?),
        None => roster.iter().map(|m| m.fiscal_year).max(),
    };
    let members: Vec<MemberEquity> = roster
        .into_iter()
        .filter(|m| Some(m.fiscal_year) == year)
        .collect();
    tracing::info!("Using {} members for fiscal year {:?}", members.len(), year);

    let output = match command {
        "summary" => serde_json::to_value(EquityCalculator::summarize(&members, settings))?,
        "reconcile" => {
            let external = decimal_arg(&args, "--balance-sheet")?.context("--balance-sheet is required")?;
            let tolerance = reconcile_tolerance(&args, settings)?;
            serde_json::to_value(Reconciler::reconcile_capital(&members, external, tolerance))?
        }
        "distribute" => {
            let amount = decimal_arg(&args, "--amount")?.context("--amount is required")?;
            let withholding = decimal_arg(&args, "--withholding")?;
            let shares = DistributionShare::from_members(&members, withholding);
            serde_json::to_value(DistributionEngine::calculate(amount, &shares, settings)?)?
        }
        "rebalance" => {
            let ids: Vec<String> = arg_value(&args, "--ids")
                .context("--ids is required")?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            let delta = decimal_arg(&args, "--delta")?.context("--delta is required")?;
            serde_json::to_value(ProRataRebalancer::rebalance_members(&members, &ids, delta)?)?
        }
        "close" => {
            let net_income =
                decimal_arg(&args, "--net-income")?.context("--net-income is required")?;
            let sofr_rate = decimal_arg(&args, "--sofr")?.unwrap_or(config.sofr_rate);
            let input = YearEndInput {
                fiscal_year: year.context("roster has no fiscal year")?,
                sofr_rate,
                net_income,
                members: YearEndMemberInput::from_members(&members),
            };
            serde_json::to_value(close_year(&input, settings)?)?
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn decimal_arg(args: &[String], flag: &str) -> Result<Option<Decimal>> {
    arg_value(args, flag)
        .map(|raw| {
            Decimal::from_str(raw.trim()).with_context(|| format!("{} is not a decimal: '{}'", flag, raw))
        })
        .transpose()
}

/// `--tolerance` when given, otherwise the configured reconciliation tolerance.
fn reconcile_tolerance(args: &[String], settings: &CalculationSettings) -> Result<Decimal> {
    match decimal_arg(args, "--tolerance")? {
        Some(tolerance) if tolerance < Decimal::ZERO => {
            bail!("--tolerance must be >= 0, got {}", tolerance)
        }
        Some(tolerance) => Ok(tolerance),
        None => Ok(settings.reconciliation_tolerance),
    }
}
