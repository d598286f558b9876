use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::cargo::{cargo, step, OnFailure};
use crate::{CHIP, TARGET};

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

pub fn run(release: bool, log: &str) -> Result<()> {
    if !LOG_LEVELS.contains(&log) {
        anyhow::bail!(
            "Unknown defmt log level '{}' (expected one of: {})",
            log,
            LOG_LEVELS.join(", ")
        );
    }
    let profile = if release { "release" } else { "debug" };

    println!();
    println!(
        "{}",
        format!("🔨 Building firmware ({} mode, DEFMT_LOG={})...", profile, log)
            .cyan()
            .bold()
    );
    println!();

    // DEFMT_LOG is a build-time filter: it decides which log strings exist.
    let mut build = cargo([
        "build", "-p", "firmware", "--target", TARGET, "--features", "hardware",
    ]);
    build.env("DEFMT_LOG", log);
    if release {
        build.arg("--release");
    }
    step("Firmware build", build, OnFailure::Abort)?;

    let binary = format!("target/{}/{}/firmware", TARGET, profile);
    show_binary_size(&binary);

    println!("{}", "📡 Flashing...".cyan().bold());
    println!("   {}", "Connecting to probe...".dimmed());

    // probe-rs run keeps streaming RTT until Ctrl-C, so inherit stdio.
    let start = Instant::now();
    let status = Command::new("probe-rs")
        .args(["run", "--chip", CHIP, "--probe-index", "0", &binary])
        .status()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    if !status.success() {
        eprintln!("{}", "✗ Flash failed".red().bold());
        anyhow::bail!("Flash failed - check that the probe is connected and the device is powered");
    }

    println!(
        "{}",
        format!("✓ Session ended after {:.2}s", start.elapsed().as_secs_f64()).green()
    );
    println!();

    Ok(())
}

fn show_binary_size(binary: &str) {
    let output = Command::new("rust-size").args([binary, "-A"]).output();

    match output {
        Ok(out) if out.status.success() => {
            println!("{}", "📊 Binary size:".cyan());
            for line in String::from_utf8_lossy(&out.stdout).lines() {
                println!("   {}", line.dimmed());
            }
            println!();
        }
        _ => println!(
            "   {}",
            "rust-size not found (cargo install cargo-binutils); skipping size report".dimmed()
        ),
    }
}
