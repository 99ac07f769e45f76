use super::subsignal;
use crate::error::AppError;
use weft_bank::{Register, RegisterKind};
use weft_flow::{Actor, Direction, ElabContext, Endpoint, Endpoints, FlowError, Layout};
use weft_ir::{Circuit, Expr, SignalDb, SignalId, Stmt, SYS_DOMAIN};
use weft_platform::PinBundle;

const TEST_PATTERN_RESET: u64 = 0x55aa;

/// How many samples per channel a DAC token carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DacRate {
    /// One `i`/`q` pair per token.
    #[default]
    Single,
    /// Two pairs per token, `i0`/`q0` then `i1`/`q1`.
    Double,
}

impl DacRate {
    /// Samples per channel in one token.
    pub fn samples(self) -> u32 {
        match self {
            DacRate::Single => 1,
            DacRate::Double => 2,
        }
    }

    /// Sink fields carrying one channel, earliest sample first.
    pub fn channel_fields(self, channel: &str) -> Vec<String> {
        match self {
            DacRate::Single => vec![channel.to_string()],
            DacRate::Double => vec![format!("{channel}0"), format!("{channel}1")],
        }
    }

    /// Width of the frame word shifted out per `sys` cycle.
    pub fn frame_width(self) -> u32 {
        match self {
            DacRate::Single => 4,
            DacRate::Double => 8,
        }
    }

    fn frame_pattern(self) -> u64 {
        match self {
            DacRate::Single => 0x6,
            DacRate::Double => 0x60,
        }
    }

    fn divider_width(self) -> u32 {
        match self {
            DacRate::Single => 3,
            DacRate::Double => 2,
        }
    }
}

/// Drives a two-channel DAC from sample tokens.
///
/// Needs a resource with `dat_i` and `dat_q` subsignals; each carries the
/// parallel word for one channel, so at double rate it holds two samples,
/// the later one in the upper half. Optional `txenable` (1 bit) and `frame`
/// ([`DacRate::frame_width`] bits) subsignals are driven when present.
///
/// With `test_pattern_en` set the outputs hold the test patterns and incoming
/// samples are refused. At single rate the `0` and `1` patterns alternate
/// every cycle. Writing `pulse_frame` requests a frame marker on the next
/// frame boundary.
#[derive(Debug)]
pub struct Dac {
    rate: DacRate,
    ports: Endpoints,
    pins: [SignalId; 2],
    txenable: Option<SignalId>,
    frame: Option<SignalId>,
    enable: Register,
    patterns: [Register; 4],
    pulse_frame: Register,
    elaborated: bool,
}

impl Dac {
    /// Creates the output stage over the granted pins.
    pub fn new(db: &mut SignalDb, pins: &PinBundle, resource: &str, rate: DacRate) -> Result<Self, AppError> {
        let shape = |reason: String| AppError::ResourceShape {
            resource: resource.to_string(),
            role: "DAC".to_string(),
            reason,
        };
        let dat_i = subsignal(pins, resource, "DAC", "dat_i")?;
        let dat_q = subsignal(pins, resource, "DAC", "dat_q")?;
        let pin_width = db.width(dat_i);
        if db.width(dat_q) != pin_width {
            return Err(shape("dat_i and dat_q differ in width".to_string()));
        }
        if pin_width % rate.samples() != 0 {
            return Err(shape(format!(
                "{pin_width}-bit data pins cannot carry {} samples",
                rate.samples()
            )));
        }
        let width = pin_width / rate.samples();

        let txenable = pins.subsignal("txenable");
        if let Some(pin) = txenable.filter(|p| db.width(*p) != 1) {
            return Err(shape(format!("txenable is {} bits wide", db.width(pin))));
        }
        let frame = pins.subsignal("frame");
        if let Some(pin) = frame.filter(|p| db.width(*p) != rate.frame_width()) {
            return Err(shape(format!(
                "frame is {} bits wide, expected {}",
                db.width(pin),
                rate.frame_width()
            )));
        }

        let fields: Vec<(String, u32)> = match rate {
            DacRate::Single => vec![("i".into(), width), ("q".into(), width)],
            DacRate::Double => ["i0", "q0", "i1", "q1"].iter().map(|f| (f.to_string(), width)).collect(),
        };
        let layout = Layout::new(fields)?;
        let reset = TEST_PATTERN_RESET & mask(width);
        let patterns = [
            Register::field(db, "test_pattern_i0", width, reset)?,
            Register::field(db, "test_pattern_q0", width, reset)?,
            Register::field(db, "test_pattern_i1", width, reset)?,
            Register::field(db, "test_pattern_q1", width, reset)?,
        ];
        Ok(Self {
            rate,
            ports: Endpoints::new().with(Endpoint::new(db, "samples", Direction::Sink, layout)),
            pins: [dat_i, dat_q],
            txenable,
            frame,
            enable: Register::field(db, "test_pattern_en", 1, 0)?,
            patterns,
            pulse_frame: Register::raw(db, "pulse_frame", 1)?,
            elaborated: false,
        })
    }

    /// Samples per channel in one token.
    pub fn rate(&self) -> DacRate {
        self.rate
    }

    /// Host-visible registers, in address order.
    pub fn registers(&self) -> Vec<Register> {
        std::iter::once(self.enable.clone())
            .chain(self.patterns.iter().cloned())
            .chain(std::iter::once(self.pulse_frame.clone()))
            .collect()
    }

    /// Storage of the `index`-th test pattern of a channel.
    fn pattern(&self, channel: usize, index: usize) -> Option<SignalId> {
        self.patterns.get(index * 2 + channel).and_then(Register::storage)
    }
}

fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

impl Actor for Dac {
    fn kind(&self) -> &str {
        "dac"
    }

    fn endpoints(&self) -> &Endpoints {
        &self.ports
    }

    fn elaborate(&mut self, ctx: &mut ElabContext<'_>) -> Result<Circuit, FlowError> {
        let (Some(samples), Some(enable), RegisterKind::Raw { re: pulse_re, w: pulse_w, .. }) =
            (self.ports.get("samples"), self.enable.storage(), self.pulse_frame.kind())
        else {
            return Ok(Circuit::new());
        };
        let rate = self.rate;
        let divider = ctx.signal("frame_div", rate.divider_width());
        let pending = ctx.signal("pulse_pending", 1);
        let fr = ctx.signal("fr", rate.frame_width());
        let txen = ctx.signal("txen", 1);

        let mut c = Circuit::new();
        c.comb(Stmt::assign(samples.ack(), Expr::signal(enable).not()))
            .comb(Stmt::assign(*pulse_w, pending));

        let boundary = Expr::signal(divider).equals(Expr::constant(0, rate.divider_width()));
        let marker = Expr::signal(pending).or(enable).or(samples.stb());
        c.comb(Stmt::assign(
            fr,
            boundary
                .clone()
                .and(marker)
                .select(
                    Expr::constant(rate.frame_pattern(), rate.frame_width()),
                    Expr::constant(0, rate.frame_width()),
                ),
        ));
        if let Some(pin) = self.frame {
            c.comb(Stmt::assign(pin, fr));
        }
        if let Some(pin) = self.txenable {
            c.comb(Stmt::assign(pin, txen));
        }

        let mut pattern = Vec::new();
        let mut load = Vec::new();
        for (channel, (name, pin)) in ["i", "q"].into_iter().zip(self.pins).enumerate() {
            let width = ctx.db().width(pin);
            let out = ctx.signal(format!("out_{name}"), width);
            c.comb(Stmt::assign(pin, out));

            let fields: Option<Vec<SignalId>> = rate
                .channel_fields(name)
                .iter()
                .map(|f| samples.field(f))
                .collect();
            let (Some(fields), Some(p0), Some(p1)) = (fields, self.pattern(channel, 0), self.pattern(channel, 1))
            else {
                continue;
            };
            let (test, sample) = match rate {
                DacRate::Single => (
                    Expr::slice(divider, 0, 0).select(p1, p0),
                    Expr::signal(fields[0]),
                ),
                DacRate::Double => (
                    Expr::Concat(vec![Expr::signal(p1), Expr::signal(p0)]),
                    Expr::Concat(fields.iter().rev().map(|f| Expr::signal(*f)).collect()),
                ),
            };
            pattern.push(Stmt::assign(out, test));
            load.push(Stmt::assign(out, sample));
        }

        c.sync(
            SYS_DOMAIN,
            Stmt::when(boundary, vec![Stmt::assign(pending, Expr::bit(false))]),
        )
        .sync(
            SYS_DOMAIN,
            Stmt::when(Expr::signal(*pulse_re), vec![Stmt::assign(pending, Expr::bit(true))]),
        )
        .sync(
            SYS_DOMAIN,
            Stmt::assign(txen, Expr::signal(enable).or(samples.stb())),
        )
        .sync(
            SYS_DOMAIN,
            Stmt::assign(divider, Expr::signal(divider).add(Expr::constant(1, rate.divider_width()))),
        )
        .sync(
            SYS_DOMAIN,
            Stmt::when(Expr::signal(enable), pattern).otherwise(vec![Stmt::when(samples.fire(), load)]),
        );
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
