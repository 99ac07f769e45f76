//! `weft check`: assemble and elaborate without writing output.

use crate::pipeline::assemble;
use crate::GlobalArgs;

/// Runs the `weft check` command.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (_, app) = assemble(global)?;
    let name = app.name().to_string();
    if !global.quiet {
        eprintln!("   Checking {name}");
    }
    let artifact = app.elaborate()?;
    if !global.quiet {
        eprintln!(
            "       Done {} signals, {} address ranges, fingerprint {}",
            artifact.signals.len(),
            artifact.symtab.len(),
            artifact.fingerprint
        );
    }
    Ok(0)
}
