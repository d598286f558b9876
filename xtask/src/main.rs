// Tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod cargo;
mod check;
mod doc;
mod flash;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Cross-compilation target for the sensor node.
pub const TARGET: &str = "thumbv7em-none-eabihf";

/// probe-rs chip name.
pub const CHIP: &str = "STM32H743ZITx";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Energy arbiter sensor node development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and flash the firmware via probe-rs, streaming defmt logs
    Flash {
        /// Build and flash release version
        #[arg(short, long)]
        release: bool,
        /// Compile-time defmt filter (trace, debug, info, warn, error, off)
        #[arg(long, default_value = "info")]
        log: String,
    },
    /// Check the firmware for the target, the energy crate for no_std, then clippy and fmt
    Check,
    /// Run host tests for the energy and firmware crates
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration and property tests
        #[arg(long)]
        integration: bool,
        /// Cases per proptest property (PROPTEST_CASES)
        #[arg(long)]
        cases: Option<u32>,
    },
    /// Build and optionally open documentation
    Doc {
        /// Open documentation in browser
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flash { release, log } => flash::run(release, &log),
        Commands::Check => check::run(),
        Commands::Test {
            unit,
            integration,
            cases,
        } => test::run(unit, integration, cases),
        Commands::Doc { open } => doc::run(open),
    }
}
