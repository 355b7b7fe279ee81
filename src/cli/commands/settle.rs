//! Monthly settlement command

use colored::Colorize;

use crate::cli::CliError;
use crate::services::{SettlementPreview, SettlementService};

fn print_preview(preview: &SettlementPreview) {
    if preview.rows.is_empty() {
        println!(
            "{} No conversions recorded in {}",
            "ℹ".bold().blue(),
            preview.month.cyan()
        );
        return;
    }

    println!(
        "{} {}",
        "Settlement for".bold().green(),
        preview.month.cyan()
    );
    println!();
    for row in &preview.rows {
        println!(
            "  {} {:<20} conversions {:>4} (pending {}, contacted {}, settled {})  payable {:>10}  settled {:>10}",
            row.agent_code.cyan(),
            row.agent_name,
            row.conversions,
            row.pending,
            row.contacted,
            row.settled,
            row.payable_amount.to_string().yellow(),
            row.settled_amount.to_string().green()
        );
    }
    println!();
    println!(
        "  total payable {}  total settled {}",
        preview.total_payable.to_string().yellow().bold(),
        preview.total_settled.to_string().green().bold()
    );
}

pub async fn run_settle(
    service: &SettlementService,
    month: &str,
    execute: bool,
    csv: Option<String>,
) -> Result<(), CliError> {
    if execute {
        let outcome = service.settle(month).await?;
        println!(
            "{} Settled {} conversions for {}",
            "✓".bold().green(),
            outcome.settled_count.to_string().bold(),
            month.cyan()
        );
        println!();
        print_preview(&outcome.preview);
    } else {
        let preview = service.preview(month).await?;
        print_preview(&preview);
        println!();
        println!(
            "{} Preview only. Re-run with {} to stamp contacted conversions as settled",
            "ℹ".bold().blue(),
            "--execute".bold()
        );
    }

    if let Some(path) = csv {
        let content = service.export_csv(month).await?;
        std::fs::write(&path, content)
            .map_err(|e| CliError::CommandError(format!("failed to write {}: {}", path, e)))?;
        println!("{} Wrote settlement CSV to {}", "✓".bold().green(), path.blue());
    }

    Ok(())
}
