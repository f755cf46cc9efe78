// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gj - gpujob client
//!
//! Submits jobs to the `gjd` inbox and reads its status board. All
//! scheduling happens in the daemon.

mod client;
mod color;
mod commands;
mod env;
mod output;
mod poll;
mod spec;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cancel, gpus, list, submit, wait};
use output::OutputFormat;

use crate::client::Client;

#[derive(Parser)]
#[command(
    name = "gj",
    version,
    about = "gpujob - batch jobs on a shared GPU node"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job
    Submit(submit::SubmitArgs),
    /// List jobs on the status board
    List(list::ListArgs),
    /// Cancel jobs you own
    Cancel(cancel::CancelArgs),
    /// Show GPUs and the jobs using them
    Gpus,
    /// Wait until jobs finish
    Wait(wait::WaitArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(1);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, the
/// "Caused by" chain is skipped. Otherwise the full chain is rendered.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let client = Client::from_env();
    match command {
        Commands::Submit(args) => submit::handle(args, &client, format)?,
        Commands::List(args) => list::handle(args, &client, format)?,
        Commands::Cancel(args) => cancel::handle(args, &client, format)?,
        Commands::Gpus => gpus::handle(&client, format)?,
        Commands::Wait(args) => wait::handle(args, &client).await?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
