use super::subsignal;
use crate::error::AppError;
use weft_flow::{Actor, Direction, ElabContext, Endpoint, Endpoints, FlowError, Layout};
use weft_ir::{Circuit, Expr, SignalDb, SignalId, Stmt, SYS_DOMAIN};
use weft_platform::PinBundle;

/// Samples a two-channel ADC every `sys` cycle.
///
/// Needs a resource with `dat_a` and `dat_b` subsignals. The converter cannot
/// be stalled: samples are offered on `samples` every cycle and dropped when
/// the consumer is not ready.
#[derive(Debug)]
pub struct AdcCapture {
    ports: Endpoints,
    dat_a: SignalId,
    dat_b: SignalId,
    elaborated: bool,
}

impl AdcCapture {
    /// Creates the capture stage over the granted pins.
    pub fn new(db: &mut SignalDb, pins: &PinBundle, resource: &str) -> Result<Self, AppError> {
        let dat_a = subsignal(pins, resource, "ADC", "dat_a")?;
        let dat_b = subsignal(pins, resource, "ADC", "dat_b")?;
        let layout = Layout::new([("a", db.width(dat_a)), ("b", db.width(dat_b))])?;
        Ok(Self {
            ports: Endpoints::new().with(Endpoint::new(db, "samples", Direction::Source, layout)),
            dat_a,
            dat_b,
            elaborated: false,
        })
    }

    /// Layout of the produced samples.
    pub fn layout(&self) -> Option<&Layout> {
        self.ports.get("samples").map(Endpoint::layout)
    }
}

impl Actor for AdcCapture {
    fn kind(&self) -> &str {
        "adc"
    }

    fn endpoints(&self) -> &Endpoints {
        &self.ports
    }

    fn elaborate(&mut self, _ctx: &mut ElabContext<'_>) -> Result<Circuit, FlowError> {
        let Some(samples) = self.ports.get("samples") else {
            return Ok(Circuit::new());
        };
        let mut c = Circuit::new();
        c.comb(Stmt::assign(samples.stb(), Expr::bit(true)));
        for (field, pin) in [("a", self.dat_a), ("b", self.dat_b)] {
            if let Some(reg) = samples.field(field) {
                c.sync(SYS_DOMAIN, Stmt::assign(reg, pin));
            }
        }
        Ok(c)
    }

    fn is_elaborated(&self) -> bool {
        self.elaborated
    }

    fn set_elaborated(&mut self, done: bool) {
        self.elaborated = done;
    }

    fn breaks_combinational_path(&self) -> bool {
        true
    }
}
