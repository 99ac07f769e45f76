//! Flattening a dataflow graph into a single actor.

use crate::actor::{elaborate_actor, Actor, ElabContext};
use crate::endpoint::{Direction, Endpoint, Endpoints};
use crate::error::FlowError;
use crate::graph::{ActorId, Connection, DataflowGraph};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};
use weft_ir::{Circuit, Expr, SignalDb, SignalId, Stmt, SYS_DOMAIN};

/// What flattening does about cycles without storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CyclePolicy {
    /// Log each cycle and continue.
    #[default]
    Warn,
    /// Fail with [`FlowError::CombinationalCycle`].
    Deny,
    /// Skip the check.
    Ignore,
}

/// An actor whose behaviour is a whole dataflow graph.
///
/// Elaboration elaborates every constituent in [`ActorId`] order, generates
/// the stb/ack glue for every connection, and merges everything into one
/// circuit. Each constituent's signals are scoped with its graph label
/// (`<kind><index>`). The composite has no ports of its own, so composites
/// nest freely.
#[derive(Debug)]
pub struct CompositeActor {
    kind: String,
    graph: DataflowGraph,
    policy: CyclePolicy,
    ports: Endpoints,
    busy: SignalId,
    elaborated: bool,
}

/// Port signals of one end of a connection, copied out of the graph.
struct PortSignals {
    stb: SignalId,
    ack: SignalId,
    fields: BTreeMap<String, SignalId>,
}

impl PortSignals {
    fn of(ep: &Endpoint) -> Self {
        Self {
            stb: ep.stb(),
            ack: ep.ack(),
            fields: ep
                .layout()
                .names()
                .map(str::to_string)
                .zip(ep.fields().iter().copied())
                .collect(),
        }
    }
}

/// One connection resolved to port signals, before handshake signals exist.
struct Link {
    source: (ActorId, String),
    sink: (ActorId, String),
    src: PortSignals,
    dst: PortSignals,
    fields: Vec<(String, String)>,
    index: usize,
}

struct Edge {
    link: Link,
    valid: SignalId,
    ready: SignalId,
}

impl CompositeActor {
    /// Wraps a graph. `kind` names the composite in scope labels.
    pub fn new(db: &mut SignalDb, kind: impl Into<String>, graph: DataflowGraph) -> Self {
        Self {
            kind: kind.into(),
            graph,
            policy: CyclePolicy::default(),
            ports: Endpoints::new(),
            busy: db.alloc("busy", 1),
            elaborated: false,
        }
    }

    /// Sets the combinational-cycle policy.
    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The wrapped graph.
    pub fn graph(&self) -> &DataflowGraph {
        &self.graph
    }

    fn check_cycles(&self) -> Result<(), FlowError> {
        if self.policy == CyclePolicy::Ignore {
            return Ok(());
        }
        for cycle in self.graph.combinational_cycles() {
            let actors: Vec<String> = cycle.iter().map(|id| self.graph.label(*id)).collect();
            match self.policy {
                CyclePolicy::Deny => return Err(FlowError::CombinationalCycle { actors }),
                _ => warn!(
                    composite = %self.kind,
                    cycle = %actors.join(" -> "),
                    "combinational cycle in dataflow graph"
                ),
            }
        }
        Ok(())
    }

    fn port_of(&self, id: ActorId, name: &str) -> Result<PortSignals, FlowError> {
        self.graph
            .actor(id)?
            .endpoints()
            .get(name)
            .map(PortSignals::of)
            .ok_or_else(|| FlowError::UnknownPort {
                actor: self.graph.label(id),
                port: name.to_string(),
            })
    }

    fn links(&self) -> Result<Vec<Link>, FlowError> {
        let raw: Vec<(ActorId, ActorId, Connection, usize)> = self
            .graph
            .connections()
            .map(|(id, s, k, c)| (s, k, c.clone(), id.index()))
            .collect();
        let mut links = Vec::with_capacity(raw.len());
        for (source, sink, conn, index) in raw {
            links.push(Link {
                src: self.port_of(source, &conn.source_port)?,
                dst: self.port_of(sink, &conn.sink_port)?,
                source: (source, conn.source_port),
                sink: (sink, conn.sink_port),
                fields: conn.fields,
                index,
            });
        }
        Ok(links)
    }

    fn handshakes(links: Vec<Link>, ctx: &mut ElabContext<'_>) -> Vec<Edge> {
        links
            .into_iter()
            .map(|link| Edge {
                valid: ctx.signal(format!("conn{}_valid", link.index), 1),
                ready: ctx.signal(format!("conn{}_ready", link.index), 1),
                link,
            })
            .collect()
    }

    fn reset_constituents(&mut self, ids: &[ActorId]) {
        for &id in ids {
            if let Some(node) = self.graph.node_mut(id) {
                node.actor.set_elaborated(false);
            }
        }
    }

    /// Inert defaults for unconnected ports of optional actors; an error for
    /// required ones.
    fn tie_off(&self, links: &[Link], glue: &mut Circuit, db: &SignalDb) -> Result<(), FlowError> {
        for id in self.graph.actor_ids() {
            let required = self.graph.is_required(id)?;
            for ep in self.graph.actor(id)?.endpoints().iter() {
                let port = (id, ep.name().to_string());
                let unconnected = || FlowError::UnconnectedPort {
                    actor: self.graph.label(id),
                    port: ep.name().to_string(),
                };
                match ep.direction() {
                    Direction::Source => {
                        if links.iter().any(|l| l.source == port) {
                            continue;
                        }
                        if required {
                            return Err(unconnected());
                        }
                        glue.comb(Stmt::assign(ep.ack(), Expr::bit(true)));
                    }
                    Direction::Sink => {
                        let incoming: Vec<&Link> = links.iter().filter(|l| l.sink == port).collect();
                        let driven: HashSet<&str> = incoming
                            .iter()
                            .flat_map(|l| l.fields.iter().map(|(_, k)| k.as_str()))
                            .collect();
                        let undriven: Vec<(&str, SignalId)> = ep
                            .token()
                            .iter()
                            .filter(|(name, _)| !driven.contains(name))
                            .collect();
                        if undriven.is_empty() && !incoming.is_empty() {
                            continue;
                        }
                        if required {
                            return Err(unconnected());
                        }
                        if incoming.is_empty() {
                            glue.comb(Stmt::assign(ep.stb(), Expr::bit(false)));
                        }
                        for (_, sig) in undriven {
                            glue.comb(Stmt::assign(sig, Expr::constant(0, db.width(sig))));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn wire(edges: &[Edge], glue: &mut Circuit, ctx: &mut ElabContext<'_>) {
        for e in edges {
            let link = &e.link;
            for (s, k) in &link.fields {
                glue.comb(Stmt::assign(link.dst.fields[k], link.src.fields[s]));
            }
        }

        let mut by_sink: BTreeMap<(ActorId, &str), Vec<&Edge>> = BTreeMap::new();
        let mut by_source: BTreeMap<(ActorId, &str), Vec<&Edge>> = BTreeMap::new();
        for e in edges {
            let link = &e.link;
            by_sink.entry((link.sink.0, link.sink.1.as_str())).or_default().push(e);
            by_source.entry((link.source.0, link.source.1.as_str())).or_default().push(e);
        }

        for group in by_sink.values() {
            let dst = &group[0].link.dst;
            if let [only] = group.as_slice() {
                glue.comb(Stmt::assign(dst.stb, only.valid))
                    .comb(Stmt::assign(only.ready, dst.ack));
            } else {
                glue.comb(Stmt::assign(
                    dst.stb,
                    Expr::all(group.iter().map(|e| Expr::signal(e.valid))),
                ));
                for e in group {
                    glue.comb(Stmt::assign(e.ready, Expr::signal(dst.ack).and(dst.stb)));
                }
            }
        }

        for group in by_source.values() {
            let src = &group[0].link.src;
            if let [only] = group.as_slice() {
                glue.comb(Stmt::assign(only.valid, src.stb))
                    .comb(Stmt::assign(src.ack, only.ready));
                continue;
            }
            let src_fire = Expr::signal(src.stb).and(src.ack);
            let mut acks = Vec::with_capacity(group.len());
            for e in group {
                let done = ctx.signal(format!("conn{}_done", e.link.index), 1);
                glue.comb(Stmt::assign(e.valid, Expr::signal(src.stb).and(Expr::signal(done).not())));
                acks.push(Expr::signal(e.ready).or(done));
                glue.sync(
                    SYS_DOMAIN,
                    Stmt::when(src_fire.clone(), vec![Stmt::assign(done, Expr::bit(false))]).otherwise(vec![
                        Stmt::when(
                            Expr::signal(e.valid).and(e.ready),
                            vec![Stmt::assign(done, Expr::bit(true))],
                        ),
                    ]),
                );
            }
            glue.comb(Stmt::assign(src.ack, Expr::all(acks)));
        }
    }
}

impl Actor for CompositeActor {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn endpoints(&self) -> &Endpoints {
        &self.ports
    }

    fn elaborate(&mut self, ctx: &mut ElabContext<'_>) -> Result<Circuit, FlowError> {
        info!(
            composite = %self.kind,
            actors = self.graph.actor_count(),
            connections = self.graph.connection_count(),
            "flattening dataflow graph"
        );

        self.check_cycles()?;
        self.graph.check_single_writer()?;
        let links = self.links()?;
        let mut glue = Circuit::new();
        self.tie_off(&links, &mut glue, ctx.db())?;

        let mut parts: Vec<(String, Circuit)> = Vec::with_capacity(self.graph.actor_count());
        let mut busy = Vec::new();
        let ids: Vec<ActorId> = self.graph.actor_ids().collect();
        for (n, &id) in ids.iter().enumerate() {
            let label = self.graph.label(id);
            let result = match self.graph.node_mut(id) {
                Some(node) => elaborate_actor(node.actor.as_mut(), ctx.db_mut()),
                None => Err(FlowError::UnknownActor { index: id.index() }),
            };
            let circuit = match result {
                Ok(circuit) => circuit,
                Err(err) => {
                    self.reset_constituents(&ids[..n]);
                    return Err(match err {
                        FlowError::AlreadyElaborated { .. } => FlowError::AlreadyElaborated { actor: label },
                        other => other,
                    });
                }
            };
            if let Some(b) = self.graph.actor(id)?.busy() {
                busy.push(Expr::signal(b));
            }
            debug!(actor = %label, statements = circuit.comb.len(), "elaborated constituent");
            parts.push((label, circuit));
        }

        let edges = Self::handshakes(links, ctx);
        Self::wire(&edges, &mut glue, ctx);
        glue.declare(self.busy)
            .comb(Stmt::assign(self.busy, Expr::any(busy)));

        let mut out = Circuit::new();
        for (label, part) in parts {
            ctx.db_mut().push_scope(&part.declared, &label);
            out.merge(part);
        }
        out.merge(glue);
        Ok(out)
    }

    fn is_elaborated(&self) -> bool {
        self.elaborated
    }

    fn set_elaborated(&mut self, done: bool) {
        self.elaborated = done;
        if !done {
            let ids: Vec<ActorId> = self.graph.actor_ids().collect();
            self.reset_constituents(&ids);
        }
    }

    fn busy(&self) -> Option<SignalId> {
        Some(self.busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Route;
    use crate::testing::Stage;
    use weft_ir::Namespace;

    fn flatten(db: &mut SignalDb, g: DataflowGraph) -> Result<Circuit, FlowError> {
        let mut top = CompositeActor::new(db, "top", g);
        elaborate_actor(&mut top, db)
    }

    fn assigns(c: &Circuit, target: SignalId) -> Vec<Expr> {
        c.comb
            .iter()
            .filter_map(|s| match s {
                Stmt::Assign { target: t, value } if t.signal() == target => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn point_to_point_wiring() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = Stage::source(&mut db, &[("x", 8)]);
        let b = Stage::sink(&mut db, &[("y", 8)]);
        let (a_src, b_dst) = (
            a.endpoints().get("source").unwrap().clone(),
            b.endpoints().get("sink").unwrap().clone(),
        );
        let ia = g.add_actor(a);
        let ib = g.add_actor(b);
        g.connect(ia, ib, Route::new().source_fields(["x"]).sink_fields(["y"]))
            .unwrap();
        let c = flatten(&mut db, g).unwrap();

        let y = b_dst.field("y").unwrap();
        assert_eq!(assigns(&c, y), vec![Expr::signal(a_src.field("x").unwrap())]);
        assert_eq!(assigns(&c, b_dst.stb()).len(), 1);
        assert_eq!(assigns(&c, a_src.ack()).len(), 1);
        assert!(c.sync.is_empty());
    }

    #[test]
    fn constituents_are_scoped() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = Stage::source(&mut db, &[("d", 4)]);
        let stb = a.endpoints().get("source").unwrap().stb();
        let ia = g.add_actor(a);
        let ib = g.add_actor(Stage::sink(&mut db, &[("d", 4)]));
        g.add_connection(ia, ib).unwrap();
        flatten(&mut db, g).unwrap();
        assert_eq!(db[stb].scoped_name(), "stage0_source_stb");
        let ns = Namespace::build(&db);
        assert_eq!(ns.name(stb), "stage0_source_stb");
    }

    #[test]
    fn required_unconnected_source_fails() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        g.add_actor(Stage::source(&mut db, &[("d", 4)]));
        let err = flatten(&mut db, g).unwrap_err();
        assert_eq!(
            err,
            FlowError::UnconnectedPort {
                actor: "stage0".into(),
                port: "source".into()
            }
        );
    }

    #[test]
    fn required_partially_driven_sink_fails() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = g.add_actor(Stage::source(&mut db, &[("d", 4)]));
        let b = g.add_actor(Stage::sink(&mut db, &[("i", 4), ("q", 4)]));
        g.connect(a, b, Route::new().sink_fields(["i"])).unwrap();
        assert!(matches!(
            flatten(&mut db, g),
            Err(FlowError::UnconnectedPort { .. })
        ));
    }

    #[test]
    fn optional_ports_get_inert_defaults() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = Stage::source(&mut db, &[("d", 4)]);
        let b = Stage::sink(&mut db, &[("d", 4)]);
        let a_ack = a.endpoints().get("source").unwrap().ack();
        let b_ep = b.endpoints().get("sink").unwrap().clone();
        g.add_optional_actor(a);
        g.add_optional_actor(b);
        let c = flatten(&mut db, g).unwrap();
        assert_eq!(assigns(&c, a_ack), vec![Expr::bit(true)]);
        assert_eq!(assigns(&c, b_ep.stb()), vec![Expr::bit(false)]);
        assert_eq!(
            assigns(&c, b_ep.field("d").unwrap()),
            vec![Expr::constant(0, 4)]
        );
    }

    #[test]
    fn join_gates_on_all_valids() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let i = g.add_actor(Stage::source(&mut db, &[("d", 8)]));
        let q = g.add_actor(Stage::source(&mut db, &[("d", 8)]));
        let dac = Stage::sink(&mut db, &[("i", 8), ("q", 8)]);
        let dac_stb = dac.endpoints().get("sink").unwrap().stb();
        let d = g.add_actor(dac);
        g.connect(i, d, Route::new().sink_fields(["i"])).unwrap();
        g.connect(q, d, Route::new().sink_fields(["q"])).unwrap();
        let c = flatten(&mut db, g).unwrap();
        match &assigns(&c, dac_stb)[..] {
            [Expr::Binary { op, .. }] => assert_eq!(*op, weft_ir::BinaryOp::And),
            other => panic!("unexpected stb drive {other:?}"),
        }
    }

    #[test]
    fn fork_adds_done_registers() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let src = g.add_actor(Stage::source(&mut db, &[("d", 8)]));
        let a = g.add_actor(Stage::sink(&mut db, &[("d", 8)]));
        let b = g.add_actor(Stage::sink(&mut db, &[("d", 8)]));
        g.add_connection(src, a).unwrap();
        g.add_connection(src, b).unwrap();
        let c = flatten(&mut db, g).unwrap();
        let done = c.sync_targets();
        assert_eq!(done.len(), 2);
        for id in done {
            assert!(db[id].name.ends_with("_done"));
            assert!(db[id].scope.is_empty());
        }
    }

    #[test]
    fn cycle_policy_deny() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = g.add_actor(Stage::new(&mut db, &[("d", 8)], &[("d", 8)]));
        let b = g.add_actor(Stage::new(&mut db, &[("d", 8)], &[("d", 8)]));
        g.add_connection(a, b).unwrap();
        g.add_connection(b, a).unwrap();
        let mut top = CompositeActor::new(&mut db, "top", g).with_cycle_policy(CyclePolicy::Deny);
        let err = elaborate_actor(&mut top, &mut db).unwrap_err();
        assert_eq!(
            err,
            FlowError::CombinationalCycle {
                actors: vec!["stage0".into(), "stage1".into()]
            }
        );
    }

    #[test]
    fn cycle_policy_warn_still_flattens() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = g.add_actor(Stage::new(&mut db, &[("d", 8)], &[("d", 8)]));
        let b = g.add_actor(Stage::new(&mut db, &[("d", 8)], &[("d", 8)]));
        g.add_connection(a, b).unwrap();
        g.add_connection(b, a).unwrap();
        assert!(flatten(&mut db, g).is_ok());
    }

    #[test]
    fn second_elaboration_rejected() {
        let mut db = SignalDb::new();
        let mut top = CompositeActor::new(&mut db, "top", DataflowGraph::new());
        elaborate_actor(&mut top, &mut db).unwrap();
        assert!(matches!(
            elaborate_actor(&mut top, &mut db),
            Err(FlowError::AlreadyElaborated { .. })
        ));
    }

    #[test]
    fn failed_flatten_reports_same_error_again() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = g.add_actor(Stage::new(&mut db, &[("d", 8)], &[("d", 8)]));
        let b = g.add_actor(Stage::new(&mut db, &[("d", 8)], &[("d", 8)]));
        g.add_connection(a, b).unwrap();
        g.add_connection(b, a).unwrap();
        let mut top = CompositeActor::new(&mut db, "top", g).with_cycle_policy(CyclePolicy::Deny);
        let first = elaborate_actor(&mut top, &mut db).unwrap_err();
        let second = elaborate_actor(&mut top, &mut db).unwrap_err();
        assert!(matches!(first, FlowError::CombinationalCycle { .. }));
        assert_eq!(first, second);
        assert!(!top.is_elaborated());
    }

    #[test]
    fn constituent_failure_rolls_back_siblings() {
        let mut db = SignalDb::new();
        let mut inner = DataflowGraph::new();
        inner.add_actor(Stage::source(&mut db, &[("d", 4)]));
        let inner = CompositeActor::new(&mut db, "inner", inner);

        let mut g = DataflowGraph::new();
        let sibling = g.add_optional_actor(Stage::source(&mut db, &[("d", 4)]));
        let nested = g.add_actor(inner);
        let mut top = CompositeActor::new(&mut db, "top", g);
        let expected = FlowError::UnconnectedPort {
            actor: "stage0".into(),
            port: "source".into(),
        };
        assert_eq!(elaborate_actor(&mut top, &mut db), Err(expected.clone()));
        assert!(!top.graph().actor(sibling).unwrap().is_elaborated());
        assert!(!top.graph().actor(nested).unwrap().is_elaborated());
        assert_eq!(elaborate_actor(&mut top, &mut db), Err(expected));
    }

    #[test]
    fn success_marks_every_constituent() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = g.add_actor(Stage::source(&mut db, &[("d", 4)]));
        let b = g.add_actor(Stage::sink(&mut db, &[("d", 4)]));
        g.add_connection(a, b).unwrap();
        let mut top = CompositeActor::new(&mut db, "top", g);
        elaborate_actor(&mut top, &mut db).unwrap();
        assert!(top.is_elaborated());
        assert!(top.graph().actor_ids().all(|id| top.graph().actor(id).unwrap().is_elaborated()));
    }

    #[test]
    fn default_connection_pairs_differently_named_fields() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = Stage::source(&mut db, &[("x", 16)]);
        let b = Stage::sink(&mut db, &[("y", 16)]);
        let (src, dst) = (
            a.endpoints().get("source").unwrap().clone(),
            b.endpoints().get("sink").unwrap().clone(),
        );
        let ia = g.add_actor(a);
        let ib = g.add_actor(b);
        g.add_connection(ia, ib).unwrap();
        let c = flatten(&mut db, g).unwrap();

        let named = |name: &str| db.iter().find(|s| s.name == name).map(|s| s.id).unwrap();
        let (valid, ready) = (named("conn0_valid"), named("conn0_ready"));
        assert_eq!(
            assigns(&c, dst.field("y").unwrap()),
            vec![Expr::signal(src.field("x").unwrap())]
        );
        assert_eq!(assigns(&c, valid), vec![Expr::signal(src.stb())]);
        assert_eq!(assigns(&c, dst.stb()), vec![Expr::signal(valid)]);
        assert_eq!(assigns(&c, ready), vec![Expr::signal(dst.ack())]);
        assert_eq!(assigns(&c, src.ack()), vec![Expr::signal(ready)]);
    }

    #[test]
    fn nested_composites() {
        let mut db = SignalDb::new();
        let mut inner = DataflowGraph::new();
        let a = Stage::source(&mut db, &[("d", 2)]);
        let stb = a.endpoints().get("source").unwrap().stb();
        let ia = inner.add_actor(a);
        let ib = inner.add_actor(Stage::sink(&mut db, &[("d", 2)]));
        inner.add_connection(ia, ib).unwrap();
        let inner = CompositeActor::new(&mut db, "inner", inner);

        let mut outer = DataflowGraph::new();
        outer.add_actor(inner);
        flatten(&mut db, outer).unwrap();
        assert_eq!(db[stb].scope, vec!["inner0", "stage0"]);
    }

    #[test]
    fn failure_leaves_scopes_untouched() {
        let mut db = SignalDb::new();
        let mut g = DataflowGraph::new();
        let a = Stage::source(&mut db, &[("d", 4)]);
        let stb = a.endpoints().get("source").unwrap().stb();
        g.add_actor(a);
        g.add_actor(Stage::sink(&mut db, &[("d", 4)]));
        assert!(flatten(&mut db, g).is_err());
        assert!(db[stb].scope.is_empty());
    }

    #[test]
    fn busy_is_or_of_constituents() {
        let mut db = SignalDb::new();
        let mut inner = DataflowGraph::new();
        inner.add_optional_actor(Stage::source(&mut db, &[("d", 1)]));
        let inner = CompositeActor::new(&mut db, "inner", inner);
        let inner_busy = inner.busy().unwrap();
        let mut g = DataflowGraph::new();
        g.add_actor(inner);
        let mut top = CompositeActor::new(&mut db, "top", g);
        let c = elaborate_actor(&mut top, &mut db).unwrap();
        let top_busy = top.busy().unwrap();
        assert_eq!(assigns(&c, top_busy), vec![Expr::signal(inner_busy)]);
    }
}
