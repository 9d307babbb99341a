use clap::Parser;
use colored::*;
use std::process;

mod cli;

use cli::sandbox::SandboxCommands;

#[derive(Parser)]
#[command(name = "agentbox")]
#[command(about = "agentbox CLI - isolated sandboxes for agent tool execution")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: SandboxCommands,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    cli::utils::init_tracing();

    let cli = Cli::parse();

    if let Err(e) = cli.command.execute().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
