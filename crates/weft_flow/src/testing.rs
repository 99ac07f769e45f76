//! A configurable pass-through actor for graph and flattening tests.

use crate::actor::{Actor, ElabContext};
use crate::endpoint::{Direction, Endpoint, Endpoints};
use crate::error::FlowError;
use crate::layout::Layout;
use weft_ir::{Circuit, Expr, SignalDb, Stmt};

#[derive(Debug)]
pub(crate) struct Stage {
    ports: Endpoints,
    registered: bool,
    elaborated: bool,
}

impl Stage {
    pub(crate) fn new(db: &mut SignalDb, sink: &[(&str, u32)], source: &[(&str, u32)]) -> Self {
        let mut ports = Endpoints::new();
        if !sink.is_empty() {
            let layout = Layout::new(sink.iter().copied()).unwrap();
            ports = ports.with(Endpoint::new(db, "sink", Direction::Sink, layout));
        }
        if !source.is_empty() {
            let layout = Layout::new(source.iter().copied()).unwrap();
            ports = ports.with(Endpoint::new(db, "source", Direction::Source, layout));
        }
        Self {
            ports,
            registered: false,
            elaborated: false,
        }
    }

    pub(crate) fn source(db: &mut SignalDb, fields: &[(&str, u32)]) -> Self {
        Self::new(db, &[], fields)
    }

    pub(crate) fn sink(db: &mut SignalDb, fields: &[(&str, u32)]) -> Self {
        Self::new(db, fields, &[])
    }

    pub(crate) fn registered(mut self) -> Self {
        self.registered = true;
        self
    }
}

impl Actor for Stage {
    fn kind(&self) -> &str {
        "stage"
    }

    fn endpoints(&self) -> &Endpoints {
        &self.ports
    }

    fn elaborate(&mut self, ctx: &mut ElabContext<'_>) -> Result<Circuit, FlowError> {
        let mut c = Circuit::new();
        let sink = self.ports.get("sink");
        let source = self.ports.get("source");
        match (sink, source) {
            (Some(sink), Some(source)) => {
                c.comb(Stmt::assign(source.stb(), sink.stb()))
                    .comb(Stmt::assign(sink.ack(), source.ack()));
                for (&i, &o) in sink.fields().iter().zip(source.fields()) {
                    if ctx.db().width(i) == ctx.db().width(o) {
                        c.comb(Stmt::assign(o, i));
                    }
                }
            }
            (None, Some(source)) => {
                c.comb(Stmt::assign(source.stb(), Expr::bit(true)));
                for &o in source.fields() {
                    c.comb(Stmt::assign(o, Expr::constant(0, ctx.db().width(o))));
                }
            }
            (Some(sink), None) => {
                c.comb(Stmt::assign(sink.ack(), Expr::bit(true)));
            }
            (None, None) => {}
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
        self.registered
    }
}
