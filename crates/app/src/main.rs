// CLI modules
mod cli;
mod logging;
mod state;
mod version;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Address, Close, Fetch, Init, Register, Show, Version};

command_enum! {
    (Init, Init),
    (Register, Register),
    (Show, Show),
    (Fetch, Fetch),
    (Close, Close),
    (Address, Address),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Held until exit so buffered log lines are flushed
    let log_guard = logging::init_logging(args.log_level);

    let ctx = cli::op::OpContext::new(args.config_path);

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            drop(log_guard);
            std::process::exit(1);
        }
    }
}
