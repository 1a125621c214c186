//! Report rendering: console tables, JSON files, and CSV files.

use anyhow::{bail, Context, Result};
use prettytable::{row, Table};
use std::path::PathBuf;
use tally_core::types::{Report, UnionReport};

/// Parsed output selection: a format plus an optional destination file.
pub struct OutputTarget {
    format: Format,
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Console,
    Json,
    Csv,
}

impl OutputTarget {
    pub fn new(format: &str, file: Option<String>) -> Result<Self> {
        let format = match format.to_ascii_lowercase().as_str() {
            "console" => Format::Console,
            "json" => Format::Json,
            "csv" => Format::Csv,
            other => bail!("invalid output format {other:?}, expected console, json, or csv"),
        };
        if format != Format::Console && file.is_none() {
            tracing::warn!("no output file specified, using a default filename");
        }
        Ok(Self {
            format,
            file: file.map(PathBuf::from),
        })
    }

    fn path_or_default(&self, stem: &str, extension: &str) -> PathBuf {
        self.file.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "{stem}-{}.{extension}",
                chrono::Utc::now().timestamp_millis()
            ))
        })
    }

    pub fn emit_report(&self, report: &Report) -> Result<()> {
        match self.format {
            Format::Console => {
                print_console_report(report);
                Ok(())
            }
            Format::Json => {
                let path = self.path_or_default("balance-report", "json");
                let contents = serde_json::to_string_pretty(report)?;
                std::fs::write(&path, contents)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("JSON report saved to {}", path.display());
                Ok(())
            }
            Format::Csv => {
                let path = self.path_or_default("balance-report", "csv");
                write_report_csv(report, &path)?;
                println!("CSV report saved to {}", path.display());
                Ok(())
            }
        }
    }

    pub fn emit_union_report(&self, report: &UnionReport) -> Result<()> {
        match self.format {
            Format::Console => {
                print_union_console_report(report);
                Ok(())
            }
            Format::Json => {
                let path = self.path_or_default("cu-comparison", "json");
                let contents = serde_json::to_string_pretty(report)?;
                std::fs::write(&path, contents)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("JSON report saved to {}", path.display());
                Ok(())
            }
            Format::Csv => {
                let path = self.path_or_default("cu-comparison", "csv");
                write_union_csv(report, &path)?;
                println!("CSV report saved to {}", path.display());
                Ok(())
            }
        }
    }
}

fn print_console_report(report: &Report) {
    println!();
    println!("BALANCE RECONCILIATION REPORT");
    println!("{}", "=".repeat(60));
    println!("Process ID:      {}", report.process_id);
    println!("Timestamp:       {}", report.timestamp.to_rfc3339());
    println!("Total Addresses: {}", report.total_addresses);
    println!();
    println!("Matching:        {}", report.matching_count);
    println!("Mismatching:     {}", report.mismatch_count);
    if report.unknown_count > 0 {
        println!("Unknown:         {}", report.unknown_count);
    }
    println!("Accuracy:        {:.2}%", report.accuracy_percentage);
    println!("Discrepancy:     {}", report.total_discrepancy);
    println!();

    if report.mismatch_count > 0 {
        let mut table = Table::new();
        table.add_row(row!["Address", "Baseline", "Gateway", "Difference"]);
        for m in &report.mismatches {
            table.add_row(row![
                m.address,
                m.baseline_balance,
                m.counterpart_balance.as_deref().unwrap_or("-"),
                m.difference.as_deref().unwrap_or("0"),
            ]);
        }
        table.printstd();
        println!();
    } else if report.unknown_count == 0 {
        println!("All balances match.");
        println!();
    }

    if report.unknown_count > 0 {
        println!("UNRESOLVED ADDRESSES ({}):", report.unknown_count);
        for u in &report.unknowns {
            println!("  {} (baseline {})", u.address, u.baseline_balance);
        }
        println!();
    }
}

fn print_union_console_report(report: &UnionReport) {
    println!();
    println!("COMPUTE UNIT COMPARISON REPORT");
    println!("{}", "=".repeat(60));
    println!("Process ID:        {}", report.process_id);
    println!("Message ID:        {}", report.message_id);
    println!("CU A:              {}", report.source_a_url);
    println!("CU B:              {}", report.source_b_url);
    println!("Timestamp:         {}", report.timestamp.to_rfc3339());
    println!();
    println!("Addresses (CU A):  {}", report.total_addresses_a);
    println!("Addresses (CU B):  {}", report.total_addresses_b);
    println!("Common:            {}", report.common_addresses);
    println!("Only in CU A:      {}", report.only_in_a);
    println!("Only in CU B:      {}", report.only_in_b);
    println!("Matching:          {}", report.matching_count);
    println!("Mismatching:       {}", report.mismatch_count);
    println!("Accuracy:          {:.2}%", report.accuracy_percentage);
    println!("Discrepancy:       {}", report.total_discrepancy);
    println!();

    if report.only_in_a > 0 {
        println!("UNIQUE TO CU A ({}):", report.only_in_a);
        for entry in report.unique_to_a.iter().take(10) {
            println!(
                "  {} -> {}",
                entry.address,
                entry.balance_a.as_deref().unwrap_or("-")
            );
        }
        if report.only_in_a > 10 {
            println!("  ... and {} more", report.only_in_a - 10);
        }
        println!();
    }

    if report.only_in_b > 0 {
        println!("UNIQUE TO CU B ({}):", report.only_in_b);
        for entry in report.unique_to_b.iter().take(10) {
            println!(
                "  {} -> {}",
                entry.address,
                entry.balance_b.as_deref().unwrap_or("-")
            );
        }
        if report.only_in_b > 10 {
            println!("  ... and {} more", report.only_in_b - 10);
        }
        println!();
    }

    if report.mismatch_count > 0 {
        let mut table = Table::new();
        table.add_row(row!["Address", "CU A", "CU B", "Difference"]);
        for m in report.mismatches.iter().take(20) {
            table.add_row(row![
                m.address,
                m.balance_a.as_deref().unwrap_or("-"),
                m.balance_b.as_deref().unwrap_or("-"),
                m.difference.as_deref().unwrap_or("0"),
            ]);
        }
        table.printstd();
        if report.mismatch_count > 20 {
            println!("... and {} more mismatches", report.mismatch_count - 20);
        }
        println!();
    } else if report.only_in_a == 0 && report.only_in_b == 0 {
        println!("All balances match across both compute units.");
        println!();
    }
}

fn write_report_csv(report: &Report, path: &std::path::Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(["Address", "Baseline", "Gateway", "Outcome", "Difference"])?;
    for c in report
        .mismatches
        .iter()
        .chain(&report.matches)
        .chain(&report.unknowns)
    {
        writer.write_record([
            c.address.as_str(),
            c.baseline_balance.as_str(),
            c.counterpart_balance.as_deref().unwrap_or(""),
            if c.matched() {
                "match"
            } else if c.counterpart_balance.is_some() {
                "mismatch"
            } else {
                "unknown"
            },
            c.difference.as_deref().unwrap_or("0"),
        ])?;
    }

    writer.write_record(std::iter::empty::<&str>())?;
    writer.write_record(["Summary"])?;
    writer.write_record(["Total Addresses", &report.total_addresses.to_string()])?;
    writer.write_record(["Matching", &report.matching_count.to_string()])?;
    writer.write_record(["Mismatching", &report.mismatch_count.to_string()])?;
    writer.write_record(["Unknown", &report.unknown_count.to_string()])?;
    writer.write_record([
        "Accuracy",
        &format!("{:.2}%", report.accuracy_percentage),
    ])?;
    writer.write_record(["Total Discrepancy", &report.total_discrepancy])?;
    writer.write_record(["Process ID", &report.process_id])?;
    writer.write_record(["Timestamp", &report.timestamp.to_rfc3339()])?;
    writer.flush()?;
    Ok(())
}

fn write_union_csv(report: &UnionReport, path: &std::path::Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([
        "Address",
        "CU A Balance",
        "CU B Balance",
        "Status",
        "Difference",
    ])?;
    for c in report
        .mismatches
        .iter()
        .chain(&report.matches)
        .chain(&report.unique_to_a)
        .chain(&report.unique_to_b)
    {
        let status = if c.only_in_a {
            "only_in_a"
        } else if c.only_in_b {
            "only_in_b"
        } else if c.difference.is_none() {
            "match"
        } else {
            "mismatch"
        };
        writer.write_record([
            c.address.as_str(),
            c.balance_a.as_deref().unwrap_or(""),
            c.balance_b.as_deref().unwrap_or(""),
            status,
            c.difference.as_deref().unwrap_or("0"),
        ])?;
    }

    writer.write_record(std::iter::empty::<&str>())?;
    writer.write_record(["Summary"])?;
    writer.write_record(["Common Addresses", &report.common_addresses.to_string()])?;
    writer.write_record(["Only in CU A", &report.only_in_a.to_string()])?;
    writer.write_record(["Only in CU B", &report.only_in_b.to_string()])?;
    writer.write_record(["Matching", &report.matching_count.to_string()])?;
    writer.write_record(["Mismatching", &report.mismatch_count.to_string()])?;
    writer.write_record([
        "Accuracy",
        &format!("{:.2}%", report.accuracy_percentage),
    ])?;
    writer.write_record(["Total Discrepancy", &report.total_discrepancy])?;
    writer.write_record(["Process ID", &report.process_id])?;
    writer.write_record(["Message ID", &report.message_id])?;
    writer.flush()?;
    Ok(())
}
