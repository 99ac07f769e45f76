use super::{AdcCapture, UID_WAVEFORM_COLLECTOR, WAVEFORM_COLLECTOR};
use crate::component::{Component, ComponentSpec, FlowComponent};
use crate::context::BuildContext;
use crate::error::AppError;
use tracing::debug;
use weft_bank::{Register, RegisterKind, StreamDirection};
use weft_flow::{
    Actor, Buffer, CompositeActor, DataflowGraph, Direction, ElabContext, Endpoint, Endpoints, FlowError, Layout,
};
use weft_ir::{Circuit, Expr, SignalDb, SignalId, Stmt, SYS_DOMAIN};

const COUNT_WIDTH: u32 = 16;

/// Forwards a fixed number of samples once armed by the host.
///
/// Writing `arm` loads the sample budget from `count`. While armed, samples on
/// `samples` are packed into `data`; when unarmed they are accepted and
/// dropped. `arm` reads back the armed flag and `remaining` the samples left.
#[derive(Debug)]
pub struct Collector {
    ports: Endpoints,
    armed: SignalId,
    arm: Register,
    count: Register,
    remaining: Register,
    elaborated: bool,
}

impl Collector {
    /// Creates a collector for samples of `layout`.
    pub fn new(db: &mut SignalDb, layout: Layout) -> Result<Self, AppError> {
        let packed = Layout::single("data", layout.width())?;
        let ports = Endpoints::new()
            .with(Endpoint::new(db, "samples", Direction::Sink, layout))
            .with(Endpoint::new(db, "data", Direction::Source, packed));
        Ok(Self {
            ports,
            armed: db.alloc("armed", 1),
            arm: Register::raw(db, "arm", 1)?,
            count: Register::field(db, "count", COUNT_WIDTH, 0)?,
            remaining: Register::raw(db, "remaining", COUNT_WIDTH)?,
            elaborated: false,
        })
    }

    /// Host-visible registers, in address order.
    pub fn registers(&self) -> Vec<Register> {
        vec![self.arm.clone(), self.count.clone(), self.remaining.clone()]
    }
}

impl Actor for Collector {
    fn kind(&self) -> &str {
        "collector"
    }

    fn endpoints(&self) -> &Endpoints {
        &self.ports
    }

    fn elaborate(&mut self, ctx: &mut ElabContext<'_>) -> Result<Circuit, FlowError> {
        let (Some(samples), Some(data)) = (self.ports.get("samples"), self.ports.get("data")) else {
            return Ok(Circuit::new());
        };
        let (
            RegisterKind::Raw { re: arm_re, w: arm_w, .. },
            RegisterKind::Field { storage: count },
            RegisterKind::Raw { w: remaining_w, .. },
        ) = (self.arm.kind(), self.count.kind(), self.remaining.kind())
        else {
            return Ok(Circuit::new());
        };
        let left = ctx.signal("left", COUNT_WIDTH);

        let mut c = Circuit::new();
        c.declare(self.armed)
            .comb(Stmt::assign(data.stb(), Expr::signal(samples.stb()).and(self.armed)))
            .comb(Stmt::assign(samples.ack(), Expr::signal(self.armed).not().or(data.ack())))
            .comb(Stmt::assign(*arm_w, self.armed))
            .comb(Stmt::assign(*remaining_w, left));
        if let Some(out) = data.field("data") {
            c.comb(Stmt::assign(out, samples.payload()));
        }

        let zero = Expr::constant(0, COUNT_WIDTH);
        c.sync(
            SYS_DOMAIN,
            Stmt::when(
                Expr::signal(*arm_re),
                vec![
                    Stmt::assign(self.armed, Expr::signal(*count).not_equals(zero)),
                    Stmt::assign(left, *count),
                ],
            )
            .otherwise(vec![Stmt::when(
                data.fire(),
                vec![
                    Stmt::assign(left, Expr::signal(left).sub(Expr::constant(1, COUNT_WIDTH))),
                    Stmt::when(
                        Expr::signal(left).equals(Expr::constant(1, COUNT_WIDTH)),
                        vec![Stmt::assign(self.armed, Expr::bit(false))],
                    ),
                ],
            )]),
        );
        Ok(c)
    }

    fn is_elaborated(&self) -> bool {
        self.elaborated
    }

    fn set_elaborated(&mut self, done: bool) {
        self.elaborated = done;
    }

    fn busy(&self) -> Option<SignalId> {
        Some(self.armed)
    }
}

/// ADC capture, a pipeline buffer and a collector feeding a host stream.
///
/// Parameters: `adc` (resource name, default `"adc"`) and `uid`. The register
/// group is named after the component; the stream is `<name>_data`.
pub fn waveform_collector(ctx: &mut BuildContext, spec: &ComponentSpec) -> Result<Box<dyn Component>, AppError> {
    let label = spec.label();
    let uid = spec.param_u32("uid", UID_WAVEFORM_COLLECTOR)?;
    let resource = spec.param_str("adc", "adc")?;

    let pins = ctx.constraints.request(&mut ctx.db, &resource, None)?;
    let adc = AdcCapture::new(&mut ctx.db, &pins, &resource)?;
    let layout = adc.layout().cloned().ok_or_else(|| AppError::ResourceShape {
        resource: resource.clone(),
        role: "ADC".to_string(),
        reason: "no sample port".to_string(),
    })?;
    let buffer = Buffer::new(&mut ctx.db, layout.clone());
    let collector = Collector::new(&mut ctx.db, layout)?;
    ctx.csrs.request(&mut ctx.db, label.clone(), uid, collector.registers())?;
    let stream = ctx
        .streams
        .request(&mut ctx.db, format!("{label}_data"), StreamDirection::ToExternal)?;

    let mut g = DataflowGraph::new();
    let adc = g.add_actor(adc);
    let buffer = g.add_actor(buffer);
    let collector = g.add_actor(collector);
    let stream = g.add_actor(stream);
    g.add_connection(adc, buffer)?;
    g.add_connection(buffer, collector)?;
    g.add_connection(collector, stream)?;
    debug!(component = %label, uid, "wired waveform collector");

    let top = CompositeActor::new(&mut ctx.db, WAVEFORM_COLLECTOR, g);
    Ok(Box::new(FlowComponent::new(label, WAVEFORM_COLLECTOR, top)))
}
