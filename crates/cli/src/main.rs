//! Paral CLI - submit and inspect expressions, or evaluate them locally.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use paral_agent::{spawn_workers, OrchestratorClient};
use paral_compiler::Compiler;
use paral_core::{
    load_dotenv, Config, Expression, ExpressionId, ExpressionStatus, ExpressionView, OperationTimes,
    TaskStatus,
};
use paral_execution::LeasePolicy;
use paral_orchestrator::Orchestrator;
use tokio::sync::watch;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "paral")]
#[command(about = "Distributed arithmetic expression calculator", long_about = None)]
struct Cli {
    /// Orchestrator base URL
    #[arg(long, global = true, env = "ORCHESTRATOR_URL", default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression in process, without a server
    Eval {
        /// Infix expression, e.g. "2+2*2"
        expression: String,
        /// Number of workers
        #[arg(long, env = "COMPUTING_POWER", default_value = "1")]
        workers: usize,
        /// Ignore configured operation times
        #[arg(long)]
        instant: bool,
        /// Print the task graph
        #[arg(long)]
        tasks: bool,
    },
    /// Submit an expression to the orchestrator
    Submit {
        /// Infix expression
        expression: String,
        /// Wait for the result
        #[arg(long)]
        wait: bool,
    },
    /// Show one expression
    Get {
        /// Expression ID
        id: String,
        /// Wait until the expression finishes
        #[arg(long)]
        wait: bool,
    },
    /// List expressions
    List {
        /// Filter by status (pending, completed, error)
        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Eval { expression, workers, instant, tasks } => {
            let config = Config::from_env();
            let times = if instant {
                OperationTimes::uniform(Duration::ZERO)
            } else {
                config.operation_times
            };
            let orchestrator = Arc::new(Orchestrator::in_memory(
                Compiler::new(times),
                LeasePolicy::from(config.lease),
            ));
            let id = orchestrator.add_expression(&expression).await?;

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let handles = spawn_workers(
                Arc::clone(&orchestrator),
                workers.max(1),
                Duration::from_millis(5),
                shutdown_rx,
            );

            let view = loop {
                let view = orchestrator.get_expression(id).await?;
                if view.status.is_terminal() {
                    break view;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            };

            let _ = shutdown_tx.send(true);
            for handle in handles {
                handle.await??;
            }
            info!("evaluated {} with {} worker(s)", id, workers);

            if tasks {
                print_view(&view);
            }
            print_result(&view)?;
        }
        Commands::Submit { expression, wait } => {
            let client = OrchestratorClient::new(&cli.url)?;
            let id = client.calculate(&expression).await?;
            if wait {
                let view = wait_for(&client, id).await?;
                print_result(&view)?;
            } else {
                println!("{}", id);
            }
        }
        Commands::Get { id, wait } => {
            let id = parse_id(&id)?;
            let client = OrchestratorClient::new(&cli.url)?;
            let view = if wait {
                wait_for(&client, id).await?
            } else {
                client.get_expression(id).await?
            };
            print_view(&view);
        }
        Commands::List { status } => {
            let filter = match status {
                Some(s) => match parse_status(&s) {
                    Some(status) => Some(status),
                    None => bail!("unknown status {:?}", s),
                },
                None => None,
            };

            let client = OrchestratorClient::new(&cli.url)?;
            let expressions: Vec<Expression> = client
                .list_expressions()
                .await?
                .into_iter()
                .filter(|e| filter.map_or(true, |s| e.status == s))
                .collect();

            println!("Expressions ({})", expressions.len());
            for expression in expressions {
                println!(
                    "  {} | {:9} | {} = {}",
                    expression.id,
                    format_status(expression.status),
                    expression.text,
                    expression.result.map_or_else(|| "?".to_string(), |r| r.to_string()),
                );
            }
        }
    }

    Ok(())
}

async fn wait_for(client: &OrchestratorClient, id: ExpressionId) -> Result<ExpressionView> {
    loop {
        let view = client.get_expression(id).await?;
        if view.status.is_terminal() {
            return Ok(view);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

fn parse_id(s: &str) -> Result<ExpressionId> {
    s.parse().map_err(|_| anyhow::anyhow!("Invalid expression ID: {}", s))
}

fn print_result(view: &ExpressionView) -> Result<()> {
    match (view.status, view.result) {
        (ExpressionStatus::Completed, Some(result)) => {
            println!("{}", result);
            Ok(())
        }
        _ => {
            let reason = view
                .tasks
                .iter()
                .find_map(|t| t.error.clone())
                .unwrap_or_else(|| "evaluation failed".to_string());
            bail!("{}: {}", view.text, reason)
        }
    }
}

fn print_view(view: &ExpressionView) {
    println!("Expression: {}", view.id);
    println!("  Text: {}", view.text);
    println!("  Status: {}", format_status(view.status));
    if let Some(result) = view.result {
        println!("  Result: {}", result);
    }
    println!("  Created: {}", view.created_at);
    println!("  Tasks ({}):", view.tasks.len());
    for task in &view.tasks {
        println!(
            "    {} | {:10} | {} {} {}{}",
            task.id,
            format_task_status(task.status),
            task.arg1,
            task.operation,
            task.arg2,
            task.result.map_or_else(String::new, |r| format!(" = {}", r)),
        );
    }
}

fn parse_status(s: &str) -> Option<ExpressionStatus> {
    match s.to_lowercase().as_str() {
        "pending" => Some(ExpressionStatus::Pending),
        "completed" => Some(ExpressionStatus::Completed),
        "error" => Some(ExpressionStatus::Error),
        _ => None,
    }
}

fn format_status(status: ExpressionStatus) -> &'static str {
    match status {
        ExpressionStatus::Pending => "PENDING",
        ExpressionStatus::Completed => "COMPLETED",
        ExpressionStatus::Error => "ERROR",
    }
}

fn format_task_status(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "PENDING",
        TaskStatus::Dispatched => "DISPATCHED",
        TaskStatus::Completed => "COMPLETED",
        TaskStatus::Error => "ERROR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("Pending"), Some(ExpressionStatus::Pending));
        assert_eq!(parse_status("error"), Some(ExpressionStatus::Error));
        assert_eq!(parse_status("done"), None);
    }

    #[test]
    fn test_cli_parses_eval() {
        let cli = Cli::try_parse_from(["paral", "eval", "2+2*2", "--instant", "--workers", "3"]).unwrap();
        match cli.command {
            Commands::Eval { expression, workers, instant, tasks } => {
                assert_eq!(expression, "2+2*2");
                assert_eq!(workers, 3);
                assert!(instant);
                assert!(!tasks);
            }
            _ => panic!("expected eval"),
        }
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("nope").is_err());
        let id = ExpressionId::new();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
