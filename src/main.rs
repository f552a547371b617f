mod agent;
mod config;
mod genai;
mod parser;
mod paths;
mod pdf_extract;
mod schema;
mod table;

use agent::{Agent, RULE};
use clap::Parser;
use genai::GenAiClient;
use paths::Layout;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Generate and self-test a bank statement parser from a sample PDF and its reference CSV.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target bank (e.g. icici); reads data/<bank>/<bank>_sample.{pdf,csv}
    #[arg(long)]
    target: String,
}

fn main() -> ExitCode {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let bank = args.target.to_lowercase();

    println!("AI AGENT FOR BANK STATEMENT PARSING");
    println!("{RULE}");

    let cfg = match config::Config::load_or_default(config::DEFAULT_CONFIG_PATH) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, path = config::DEFAULT_CONFIG_PATH, "Failed to load config");
            println!("\n✗ Invalid config {}: {e}", config::DEFAULT_CONFIG_PATH);
            return ExitCode::FAILURE;
        }
    };

    let agent = Agent::new(Layout::new("."), GenAiClient::from_config(&cfg.genai));
    agent.announce();

    match agent.run(&bank) {
        Ok(summary) => {
            info!(
                parser = %summary.parser_path.display(),
                parsed = summary.report.parsed_row_count,
                expected = summary.report.expected_row_count,
                columns_match = summary.report.columns_match,
                "Agent run finished"
            );
            println!("\nChallenge completed successfully!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, bank = %bank, "Agent run failed");
            println!("✗ {e}");
            println!("\n✗ Challenge incomplete");
            ExitCode::FAILURE
        }
    }
}
