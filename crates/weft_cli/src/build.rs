//! `weft build`: elaborate and write the artifact and symbol table.

use std::path::PathBuf;

use tracing::info;

use crate::pipeline::assemble;
use crate::{BuildArgs, GlobalArgs};

/// Runs the `weft build` command.
///
/// Writes `<name>.artifact.json` and `<name>.symtab` into the output
/// directory, `build/` under the application directory by default.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (root, app) = assemble(global)?;
    let name = app.name().to_string();
    if !global.quiet {
        eprintln!("   Building {name}");
    }
    let artifact = app.elaborate()?;

    let out_dir = args
        .out_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| root.join("build"));
    std::fs::create_dir_all(&out_dir)?;

    let artifact_path = out_dir.join(format!("{name}.artifact.json"));
    std::fs::write(&artifact_path, artifact.to_json()?)?;
    let symtab_path = out_dir.join(format!("{name}.symtab"));
    std::fs::write(&symtab_path, artifact.formatted_symtab())?;
    info!(artifact = %artifact_path.display(), symtab = %symtab_path.display(), "wrote outputs");

    if !global.quiet {
        eprintln!("   Finished {} ({})", out_dir.display(), artifact.fingerprint);
    }
    Ok(0)
}
