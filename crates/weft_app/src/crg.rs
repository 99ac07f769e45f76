//! Clock and reset generation.

use crate::component::Component;
use crate::context::BuildContext;
use crate::error::AppError;
use std::collections::BTreeMap;
use tracing::debug;
use weft_common::Frequency;
use weft_config::ClockDef;
use weft_ir::{Circuit, ClockDomain, Expr, SignalDb, SignalId, Stmt};
use weft_platform::PinBundle;

/// Drives one clock domain per configured clock straight from its input pin.
///
/// A domain with a reset pin follows that pin. A domain without one gets a
/// power-on reset that is high until the first clock edge.
#[derive(Debug)]
pub struct Crg {
    domains: Vec<ClockDomain>,
    circuit: Circuit,
}

impl Crg {
    /// Requests the clock and reset pins and builds the domains.
    pub fn new(ctx: &mut BuildContext, clocks: &BTreeMap<String, ClockDef>) -> Result<Self, AppError> {
        let mut domains = Vec::new();
        let mut circuit = Circuit::new();
        for (name, def) in clocks {
            let frequency: Frequency = def.frequency.parse()?;
            let pin = single_pin(ctx, &def.pin, "clock input")?;
            let clock = ctx.db.alloc(format!("{name}_clk"), 1);
            circuit.declare(clock).comb(Stmt::assign(clock, pin));

            let reset = match &def.reset_pin {
                Some(reset_pin) => {
                    let pin = single_pin(ctx, reset_pin, "reset input")?;
                    let reset = ctx.db.alloc(format!("{name}_rst"), 1);
                    circuit.comb(Stmt::assign(reset, pin));
                    reset
                }
                None => {
                    let reset = ctx.db.alloc_with_reset(format!("{name}_rst"), 1, 1);
                    circuit.sync(name, Stmt::assign(reset, Expr::bit(false)));
                    reset
                }
            };
            circuit.declare(reset);
            debug!(domain = %name, %frequency, "generated clock domain");
            domains.push(ClockDomain {
                name: name.clone(),
                clock,
                reset: Some(reset),
                frequency: Some(frequency),
            });
        }
        Ok(Self { domains, circuit })
    }

    /// Generated domains, sorted by name.
    pub fn domains(&self) -> &[ClockDomain] {
        &self.domains
    }
}

impl Component for Crg {
    fn name(&self) -> &str {
        "crg"
    }

    fn kind(&self) -> &str {
        "crg"
    }

    fn elaborate(&mut self, db: &mut SignalDb) -> Result<Circuit, AppError> {
        let circuit = std::mem::take(&mut self.circuit);
        db.push_scope(&circuit.declared, "crg");
        Ok(circuit)
    }
}

fn single_pin(ctx: &mut BuildContext, resource: &str, role: &str) -> Result<SignalId, AppError> {
    let shape_error = |reason: &str| AppError::ResourceShape {
        resource: resource.to_string(),
        role: role.to_string(),
        reason: reason.to_string(),
    };
    match ctx.constraints.request(&mut ctx.db, resource, None)? {
        PinBundle::Single(id) if ctx.db.width(id) == 1 => Ok(id),
        PinBundle::Single(_) => Err(shape_error("expected exactly one pin")),
        PinBundle::Compound(_) => Err(shape_error("expected plain pins, found subsignals")),
    }
}
