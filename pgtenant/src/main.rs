//! PostgreSQL tenant privilege tool.
//!
//! Grants and revokes privileges for tenant roles and transfers database
//! and public schema ownership.
//!
//! # Security Guarantees
//! - Privilege names are validated before any statement is issued
//! - No credentials stored or logged
//! - Passwords read with `-W` are wiped from memory after use

use clap::Parser;
use pgtenant::{Cli, run};
use pgtenant_core::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    match run(&cli).await {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
