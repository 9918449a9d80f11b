//! Command line entry point for the headless runner.
//!
//! ```bash
//! # Verify a recording replays cleanly and print its final hash
//! cargo run -p gridfall_headless -- verify --file run.gfp
//!
//! # Check a recording against a known-good hash (CI regression gate)
//! cargo run -p gridfall_headless -- verify --file run.gfp --expect-hash 0123456789abcdef
//!
//! # Render the board as of tick 300
//! cargo run -p gridfall_headless -- inspect --file run.gfp --tick 300
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gridfall_headless::{inspect_at, render_ascii, verify_file, HeadlessError};

#[derive(Parser)]
#[command(name = "gridfall_headless")]
#[command(about = "Headless playthrough runner for replay verification")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-simulate a recording and report the outcome
    Verify {
        /// Recording file to verify
        #[arg(short, long)]
        file: PathBuf,

        /// Fail unless the final state hash equals this hex value
        #[arg(long)]
        expect_hash: Option<String>,
    },

    /// Re-simulate a prefix of a recording and render the board
    Inspect {
        /// Recording file to inspect
        #[arg(short, long)]
        file: PathBuf,

        /// Tick to reconstruct (number of inputs to replay)
        #[arg(short, long, default_value = "0")]
        tick: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Verify { file, expect_hash } => cmd_verify(&file, expect_hash.as_deref()),
        Commands::Inspect { file, tick } => cmd_inspect(&file, tick),
    };

    if let Err(e) = result {
        eprintln!("FAIL: {e}");
        std::process::exit(1);
    }
}

fn cmd_verify(file: &PathBuf, expect_hash: Option<&str>) -> Result<(), HeadlessError> {
    let report = verify_file(file)?;
    println!("ticks:    {}", report.ticks);
    println!("status:   {:?}", report.status);
    println!("enemies:  {}", report.enemies_alive);
    println!("portals:  {}", report.portals_alive);
    println!("hash:     {:016x}", report.final_hash);

    if let Some(expected) = expect_hash {
        let actual = format!("{:016x}", report.final_hash);
        if actual != expected.to_lowercase() {
            eprintln!("FAIL: hash mismatch, expected {expected}, got {actual}");
            std::process::exit(1);
        }
        eprintln!("PASS: hash matches");
    }
    Ok(())
}

fn cmd_inspect(file: &PathBuf, tick: u64) -> Result<(), HeadlessError> {
    let world = inspect_at(file, tick)?;
    print!("{}", render_ascii(&world));
    Ok(())
}
