//! `weft symtab`: print the address map.

use weft_bank::format_symtab;

use crate::pipeline::assemble;
use crate::{GlobalArgs, SymtabArgs, SymtabFormat};

/// Runs the `weft symtab` command.
///
/// The address map is complete once components are assembled, so no
/// elaboration is needed.
pub fn run(args: &SymtabArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (_, app) = assemble(global)?;
    let symtab = app.symtab()?;
    match args.format {
        SymtabFormat::Text => print!("{}", format_symtab(&symtab)),
        SymtabFormat::Json => println!("{}", serde_json::to_string_pretty(&symtab)?),
    }
    Ok(0)
}
