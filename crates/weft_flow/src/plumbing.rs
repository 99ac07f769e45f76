//! Generic plumbing actors.

use crate::actor::{Actor, ElabContext};
use crate::endpoint::{Direction, Endpoint, Endpoints};
use crate::error::FlowError;
use crate::layout::Layout;
use weft_ir::{Circuit, Expr, SignalDb, SignalId, Stmt, SYS_DOMAIN};

/// A one-stage pipeline register.
///
/// Accepts a token on `d` whenever it is empty or its token leaves on `q` in
/// the same cycle. The payload is registered, so a buffer breaks
/// combinational paths between its neighbours.
#[derive(Debug)]
pub struct Buffer {
    ports: Endpoints,
    valid: SignalId,
    elaborated: bool,
}

impl Buffer {
    /// Creates a buffer for tokens of `layout`.
    pub fn new(db: &mut SignalDb, layout: Layout) -> Self {
        let ports = Endpoints::new()
            .with(Endpoint::new(db, "d", Direction::Sink, layout.clone()))
            .with(Endpoint::new(db, "q", Direction::Source, layout));
        Self {
            ports,
            valid: db.alloc("valid", 1),
            elaborated: false,
        }
    }
}

impl Actor for Buffer {
    fn kind(&self) -> &str {
        "buffer"
    }

    fn endpoints(&self) -> &Endpoints {
        &self.ports
    }

    fn elaborate(&mut self, ctx: &mut ElabContext<'_>) -> Result<Circuit, FlowError> {
        let (Some(d), Some(q)) = (self.ports.get("d"), self.ports.get("q")) else {
            return Ok(Circuit::new());
        };
        let mut c = Circuit::new();
        c.declare(self.valid)
            .comb(Stmt::assign(d.ack(), Expr::signal(self.valid).not().or(q.ack())))
            .comb(Stmt::assign(q.stb(), self.valid));

        let mut load = Vec::new();
        for (name, (&input, &output)) in d.layout().names().zip(d.fields().iter().zip(q.fields())) {
            let width = ctx.db().width(input);
            let reg = ctx.signal(format!("reg_{name}"), width);
            c.comb(Stmt::assign(output, reg));
            load.push(Stmt::assign(reg, input));
        }
        load.push(Stmt::assign(self.valid, Expr::bit(true)));

        c.sync(
            SYS_DOMAIN,
            Stmt::when(d.fire(), load).otherwise(vec![Stmt::when(
                q.fire(),
                vec![Stmt::assign(self.valid, Expr::bit(false))],
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
        Some(self.valid)
    }

    fn breaks_combinational_path(&self) -> bool {
        true
    }
}

/// Splits one packed field into equal-width parts.
///
/// The single field of `d` is cut into `s0`, `s1`, ... on `q`, least
/// significant part first. Purely combinational; the handshake passes
/// straight through.
#[derive(Debug)]
pub struct Unpack {
    ports: Endpoints,
    elaborated: bool,
}

impl Unpack {
    /// Creates a splitter for a `width`-bit field named `field` into `parts`
    /// parts.
    pub fn new(db: &mut SignalDb, field: &str, width: u32, parts: u32) -> Result<Self, FlowError> {
        if parts == 0 || width % parts != 0 {
            return Err(FlowError::UnevenSplit {
                field: field.to_string(),
                width,
                parts,
            });
        }
        let part = width / parts;
        let packed = Layout::single(field, width)?;
        let split = Layout::new((0..parts).map(|k| (format!("s{k}"), part)))?;
        let ports = Endpoints::new()
            .with(Endpoint::new(db, "d", Direction::Sink, packed))
            .with(Endpoint::new(db, "q", Direction::Source, split));
        Ok(Self {
            ports,
            elaborated: false,
        })
    }
}

impl Actor for Unpack {
    fn kind(&self) -> &str {
        "unpack"
    }

    fn endpoints(&self) -> &Endpoints {
        &self.ports
    }

    fn elaborate(&mut self, ctx: &mut ElabContext<'_>) -> Result<Circuit, FlowError> {
        let (Some(d), Some(q)) = (self.ports.get("d"), self.ports.get("q")) else {
            return Ok(Circuit::new());
        };
        let Some(&packed) = d.fields().first() else {
            return Ok(Circuit::new());
        };
        let mut c = Circuit::new();
        c.comb(Stmt::assign(q.stb(), d.stb()))
            .comb(Stmt::assign(d.ack(), q.ack()));
        let mut low = 0;
        for &part in q.fields() {
            let width = ctx.db().width(part);
            c.comb(Stmt::assign(part, Expr::slice(packed, low + width - 1, low)));
            low += width;
        }
        Ok(c)
    }

    fn is_elaborated(&self) -> bool {
        self.elaborated
    }

    fn set_elaborated(&mut self, done: bool) {
        self.elaborated = done;
    }
}
