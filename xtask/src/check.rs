use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{cargo, step, OnFailure};
use crate::TARGET;

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    step(
        "Firmware for the hardware target (STM32H743)",
        cargo([
            "check", "-p", "firmware", "--target", TARGET, "--features", "hardware",
        ]),
        OnFailure::Abort,
    )?;

    // The arbiter must stay no_std with and without defmt.
    step(
        "Energy crate (no_std)",
        cargo(["check", "-p", "energy", "--target", TARGET, "--no-default-features"]),
        OnFailure::Abort,
    )?;
    step(
        "Energy crate (no_std + defmt)",
        cargo([
            "check", "-p", "energy", "--target", TARGET, "--features", "defmt",
        ]),
        OnFailure::Abort,
    )?;

    step(
        "Host library build",
        cargo(["check", "-p", "firmware", "--lib"]),
        OnFailure::Abort,
    )?;

    step(
        "Clippy lints",
        cargo(["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]),
        OnFailure::Warn,
    )?;

    if step(
        "Formatting",
        cargo(["fmt", "--all", "--check"]),
        OnFailure::Warn,
    )?
    .is_none()
    {
        eprintln!("     Run 'cargo fmt --all' to fix");
        println!();
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
