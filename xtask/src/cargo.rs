use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

/// How a failed step affects the overall task.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Print stderr and abort the task.
    Abort,
    /// Print a warning and keep going.
    Warn,
}

/// `cargo` with the given arguments.
pub fn cargo<I, S>(args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::new("cargo");
    cmd.args(args);
    cmd
}

/// Run one named step, reporting timing and outcome.
///
/// Returns the captured output on success, `None` when a `Warn` step failed.
pub fn step(label: &str, mut cmd: Command, on_failure: OnFailure) -> Result<Option<Output>> {
    println!("{}", format!("  {}...", label).cyan());
    let start = Instant::now();

    let output = cmd
        .output()
        .with_context(|| format!("Failed to spawn step: {}", label))?;

    if output.status.success() {
        println!(
            "{}",
            format!(
                "  ✓ {} passed in {:.2}s",
                label,
                start.elapsed().as_secs_f64()
            )
            .green()
        );
        println!();
        return Ok(Some(output));
    }

    match on_failure {
        OnFailure::Abort => {
            eprintln!("{}", format!("  ✗ {} failed", label).red().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            for line in String::from_utf8_lossy(&output.stdout).lines() {
                eprintln!("  {}", line);
            }
            anyhow::bail!("{} failed", label);
        }
        OnFailure::Warn => {
            eprintln!("{}", format!("  ⚠ {} reported problems", label).yellow().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            println!();
            Ok(None)
        }
    }
}

/// Sum every "test result:" line in cargo test output.
pub fn test_summary(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut passed = 0u64;
    let mut failed = 0u64;
    let mut suites = 0u64;

    for line in stdout.lines() {
        let Some(rest) = line.split("test result:").nth(1) else {
            continue;
        };
        suites = suites.saturating_add(1);
        for part in rest.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let count: u64 = count.trim_end_matches('.').parse().unwrap_or(0);
            match kind {
                "passed" => passed = passed.saturating_add(count),
                "failed" => failed = failed.saturating_add(count),
                _ => {}
            }
        }
    }

    if suites == 0 {
        "(summary not available)".to_string()
    } else {
        format!("({} passed, {} failed across {} suites)", passed, failed, suites)
    }
}
