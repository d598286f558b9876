use anyhow::Result;
use colored::Colorize;

use crate::cargo::{cargo, step, OnFailure};

pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building documentation...".cyan().bold());
    println!();

    let mut cmd = cargo(["doc", "-p", "energy", "-p", "firmware", "--no-deps", "--document-private-items"]);
    if open {
        cmd.arg("--open");
    }
    step("Documentation", cmd, OnFailure::Abort)?;

    if !open {
        println!(
            "   {}",
            "Open target/doc/energy/index.html in your browser".dimmed()
        );
        println!(
            "   {}",
            "Or run 'cargo run -p xtask -- doc --open'".dimmed()
        );
        println!();
    }

    Ok(())
}
