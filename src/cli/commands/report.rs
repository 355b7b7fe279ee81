//! Summary report command

use colored::Colorize;

use crate::cli::CliError;
use crate::services::{Granularity, ReportingService};

fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

pub async fn run_report(
    service: &ReportingService,
    start: Option<String>,
    end: Option<String>,
    granularity: &str,
    full_roster: bool,
) -> Result<(), CliError> {
    let (start, end) =
        ReportingService::parse_date_range_strict(start.as_deref(), end.as_deref())?;
    let granularity: Granularity = granularity.parse().map_err(|_| {
        CliError::ParseError(format!(
            "invalid granularity '{}': expected day or month",
            granularity
        ))
    })?;

    let report = service.summary(start, end, granularity, full_roster).await?;

    println!(
        "{} {} to {}",
        "Report".bold().green(),
        report.start.format("%Y-%m-%d").to_string().cyan(),
        report.end.format("%Y-%m-%d").to_string().cyan()
    );
    println!();
    println!(
        "  clicks {}  sessions {}  conversions {}  rate {}  value {}  commission {}",
        report.totals.clicks.to_string().bold(),
        report.totals.sessions.to_string().bold(),
        report.totals.conversions.to_string().bold(),
        format_rate(report.totals.conversion_rate).yellow(),
        report.totals.estimated_value,
        report.totals.commission.to_string().green()
    );

    if report.agents.is_empty() {
        println!();
        println!("{} No agent activity in this range", "ℹ".bold().blue());
        return Ok(());
    }

    println!();
    println!("{}", "Per agent:".bold());
    for row in &report.agents {
        let mut line = format!(
            "  {} {:<20} clicks {:>6}  conversions {:>4}  rate {:>6}  commission {:>10}",
            row.code.cyan(),
            row.name,
            row.clicks,
            row.conversions,
            format_rate(row.conversion_rate),
            row.commission
        );
        if !row.active {
            line.push_str(&format!(" {}", "[inactive]".red()));
        }
        println!("{}", line);
    }

    if !report.timeline.is_empty() {
        println!();
        println!("{}", "Timeline:".bold());
        for bucket in &report.timeline {
            println!(
                "  {}  clicks {:>6}  conversions {:>4}  commission {:>10}",
                bucket.period.cyan(),
                bucket.clicks,
                bucket.conversions,
                bucket.commission
            );
        }
    }

    Ok(())
}
