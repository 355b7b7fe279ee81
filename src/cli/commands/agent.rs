//! Agent roster commands

use colored::Colorize;

use crate::cli::CliError;
use crate::commission::CommissionPlan;
use crate::services::{AgentService, CreateAgentRequest};

fn format_plan(plan: &CommissionPlan) -> String {
    match plan {
        CommissionPlan::Fixed { amount } => format!("fixed {}", amount),
        CommissionPlan::Percentage { rate } => format!("{}%", rate),
    }
}

pub async fn add_agent(
    service: &AgentService,
    name: String,
    code: Option<String>,
    fixed: Option<i64>,
    percentage: Option<f64>,
    memo: Option<String>,
    contact: Option<String>,
) -> Result<(), CliError> {
    let plan = match (fixed, percentage) {
        (Some(amount), None) => CommissionPlan::Fixed { amount },
        (None, Some(rate)) => CommissionPlan::Percentage { rate },
        _ => {
            return Err(CliError::ParseError(
                "exactly one of --fixed or --percentage is required".to_string(),
            ));
        }
    };

    let result = service
        .create_agent(CreateAgentRequest {
            code,
            name,
            memo,
            contact,
            plan,
        })
        .await?;

    if result.generated_code {
        println!(
            "{} Generated tracking code: {}",
            "ℹ".bold().blue(),
            result.agent.code.magenta()
        );
    }

    println!(
        "{} Added agent: {} ({}) at {}",
        "✓".bold().green(),
        result.agent.code.cyan(),
        result.agent.name,
        format_plan(&result.agent.plan).yellow()
    );

    Ok(())
}

pub async fn list_agents(service: &AgentService, all: bool) -> Result<(), CliError> {
    let agents = service.list_agents(all).await?;

    if agents.is_empty() {
        println!("{} No agents registered", "ℹ".bold().blue());
        return Ok(());
    }

    println!("{}", "Agent roster:".bold().green());
    println!();
    for agent in &agents {
        let mut info_parts = vec![format!(
            "{} {}",
            agent.code.cyan(),
            agent.name.clone().bold()
        )];

        info_parts.push(format!("({})", format_plan(&agent.plan)).yellow().to_string());

        if let Some(ref contact) = agent.contact {
            info_parts.push(format!("<{}>", contact).dimmed().to_string());
        }

        if !agent.active {
            info_parts.push("[inactive]".red().to_string());
        }

        println!("  {}", info_parts.join(" "));
    }
    println!();
    println!(
        "{} Total {} agents",
        "ℹ".bold().blue(),
        agents.len().to_string().green()
    );

    Ok(())
}

pub async fn deactivate_agent(service: &AgentService, code: &str) -> Result<(), CliError> {
    service.deactivate_agent(code).await?;

    println!(
        "{} Deactivated agent: {} (history kept)",
        "✓".bold().green(),
        code.cyan()
    );

    Ok(())
}
