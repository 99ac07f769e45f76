//! The dataflow graph: actors as nodes, routed port connections as edges.
//!
//! The graph only records and validates wiring. Handshake glue is generated
//! when a [`CompositeActor`](crate::CompositeActor) flattens it.

use crate::actor::Actor;
use crate::endpoint::{Direction, Endpoint};
use crate::error::FlowError;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Stable handle to an actor in a [`DataflowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(NodeIndex);

impl ActorId {
    /// Insertion index of the actor.
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Stable handle to a connection in a [`DataflowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(EdgeIndex);

impl ConnectionId {
    /// Insertion index of the connection.
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// Which ports and fields a connection joins.
///
/// Omitted ports default to the actor's only port of the right direction;
/// omitted field lists default to every field in declared order. Fields are
/// paired positionally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Route {
    /// Source port name.
    pub source_port: Option<String>,
    /// Sink port name.
    pub sink_port: Option<String>,
    /// Source fields to forward.
    pub source_fields: Option<Vec<String>>,
    /// Sink fields to drive.
    pub sink_fields: Option<Vec<String>>,
}

impl Route {
    /// A route using sole ports and all fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the source port.
    pub fn from_port(mut self, name: impl Into<String>) -> Self {
        self.source_port = Some(name.into());
        self
    }

    /// Names the sink port.
    pub fn to_port(mut self, name: impl Into<String>) -> Self {
        self.sink_port = Some(name.into());
        self
    }

    /// Restricts the forwarded source fields.
    pub fn source_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts the driven sink fields.
    pub fn sink_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sink_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// A validated connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Source port name.
    pub source_port: String,
    /// Sink port name.
    pub sink_port: String,
    /// `(source field, sink field)` pairs.
    pub fields: Vec<(String, String)>,
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) actor: Box<dyn Actor>,
    pub(crate) required: bool,
}

/// Actors and the connections between them.
#[derive(Debug, Default)]
pub struct DataflowGraph {
    pub(crate) graph: DiGraph<Node, Connection>,
}

impl DataflowGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an actor whose ports must all be connected.
    pub fn add_actor(&mut self, actor: impl Actor + 'static) -> ActorId {
        self.insert(Box::new(actor), true)
    }

    /// Adds an actor whose unconnected ports take inert defaults.
    pub fn add_optional_actor(&mut self, actor: impl Actor + 'static) -> ActorId {
        self.insert(Box::new(actor), false)
    }

    /// Adds an already boxed actor.
    pub fn add_boxed_actor(&mut self, actor: Box<dyn Actor>, required: bool) -> ActorId {
        self.insert(actor, required)
    }

    fn insert(&mut self, actor: Box<dyn Actor>, required: bool) -> ActorId {
        let id = ActorId(self.graph.add_node(Node { actor, required }));
        debug!(actor = %self.label(id), required, "added actor");
        id
    }

    fn node(&self, id: ActorId) -> Result<&Node, FlowError> {
        self.graph
            .node_weight(id.0)
            .ok_or(FlowError::UnknownActor { index: id.index() })
    }

    pub(crate) fn node_mut(&mut self, id: ActorId) -> Option<&mut Node> {
        self.graph.node_weight_mut(id.0)
    }

    /// The actor behind a handle.
    pub fn actor(&self, id: ActorId) -> Result<&dyn Actor, FlowError> {
        self.node(id).map(|n| n.actor.as_ref())
    }

    /// Whether the actor's ports must all be connected.
    pub fn is_required(&self, id: ActorId) -> Result<bool, FlowError> {
        self.node(id).map(|n| n.required)
    }

    /// The scope label of an actor: its kind followed by its index.
    pub fn label(&self, id: ActorId) -> String {
        match self.graph.node_weight(id.0) {
            Some(n) => format!("{}{}", n.actor.kind(), id.index()),
            None => format!("?{}", id.index()),
        }
    }

    /// Connects the sole source port of `source` to the sole sink port of
    /// `sink`, all fields.
    pub fn add_connection(&mut self, source: ActorId, sink: ActorId) -> Result<ConnectionId, FlowError> {
        self.connect(source, sink, Route::new())
    }

    /// Adds a routed connection.
    pub fn connect(&mut self, source: ActorId, sink: ActorId, route: Route) -> Result<ConnectionId, FlowError> {
        let conn = self.resolve(source, sink, &route)?;
        let mut driven = self.driven_fields(sink, &conn.sink_port);
        for (_, field) in &conn.fields {
            if !driven.insert(field.clone()) {
                return Err(FlowError::PortConflict {
                    actor: self.label(sink),
                    port: conn.sink_port.clone(),
                    field: field.clone(),
                });
            }
        }
        Ok(self.push_edge(source, sink, conn))
    }

    /// Adds a routed connection without the single-writer check.
    ///
    /// Layouts are still validated. Flattening re-checks single writers.
    pub fn add_connection_unchecked(
        &mut self,
        source: ActorId,
        sink: ActorId,
        route: Route,
    ) -> Result<ConnectionId, FlowError> {
        let conn = self.resolve(source, sink, &route)?;
        Ok(self.push_edge(source, sink, conn))
    }

    fn push_edge(&mut self, source: ActorId, sink: ActorId, conn: Connection) -> ConnectionId {
        debug!(
            source = %self.label(source),
            sink = %self.label(sink),
            fields = conn.fields.len(),
            "added connection"
        );
        ConnectionId(self.graph.add_edge(source.0, sink.0, conn))
    }

    fn driven_fields(&self, sink: ActorId, port: &str) -> HashSet<String> {
        self.graph
            .edges_directed(sink.0, petgraph::Direction::Incoming)
            .filter(|e| e.weight().sink_port == port)
            .flat_map(|e| e.weight().fields.iter().map(|(_, k)| k.clone()))
            .collect()
    }

    fn port(&self, id: ActorId, name: Option<&str>, direction: Direction) -> Result<&Endpoint, FlowError> {
        let ports = self.actor(id)?.endpoints();
        match name {
            Some(name) => ports.get(name).ok_or_else(|| FlowError::UnknownPort {
                actor: self.label(id),
                port: name.to_string(),
            }),
            None => ports.sole(direction).ok_or_else(|| FlowError::AmbiguousPort {
                actor: self.label(id),
                direction,
                count: ports.of(direction).count(),
            }),
        }
    }

    fn resolve(&self, source: ActorId, sink: ActorId, route: &Route) -> Result<Connection, FlowError> {
        let src = self.port(source, route.source_port.as_deref(), Direction::Source)?;
        let dst = self.port(sink, route.sink_port.as_deref(), Direction::Sink)?;
        let connection = format!(
            "{}.{} -> {}.{}",
            self.label(source),
            src.name(),
            self.label(sink),
            dst.name()
        );
        let mismatch = |reason: String| FlowError::LayoutMismatch {
            connection: connection.clone(),
            reason,
        };

        if src.direction() != Direction::Source {
            return Err(mismatch(format!("'{}' is not a source port", src.name())));
        }
        if dst.direction() != Direction::Sink {
            return Err(mismatch(format!("'{}' is not a sink port", dst.name())));
        }

        let all = |ep: &Endpoint| ep.layout().names().map(str::to_string).collect::<Vec<_>>();
        let src_fields = route.source_fields.clone().unwrap_or_else(|| all(src));
        let dst_fields = route.sink_fields.clone().unwrap_or_else(|| all(dst));
        if src_fields.len() != dst_fields.len() {
            return Err(mismatch(format!(
                "{} source fields paired with {} sink fields",
                src_fields.len(),
                dst_fields.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(src_fields.len());
        for (s, k) in src_fields.into_iter().zip(dst_fields) {
            let sf = src
                .layout()
                .field(&s)
                .ok_or_else(|| mismatch(format!("source has no field '{s}'")))?;
            let kf = dst
                .layout()
                .field(&k)
                .ok_or_else(|| mismatch(format!("sink has no field '{k}'")))?;
            if sf.width != kf.width {
                return Err(mismatch(format!(
                    "field '{s}' is {} bits but '{k}' is {} bits",
                    sf.width, kf.width
                )));
            }
            if !seen.insert(k.clone()) {
                return Err(FlowError::PortConflict {
                    actor: self.label(sink),
                    port: dst.name().to_string(),
                    field: k,
                });
            }
            fields.push((s, k));
        }

        Ok(Connection {
            source_port: src.name().to_string(),
            sink_port: dst.name().to_string(),
            fields,
        })
    }

    /// Verifies that no sink field is driven by two connections.
    pub fn check_single_writer(&self) -> Result<(), FlowError> {
        for node in self.graph.node_indices() {
            let mut driven = HashSet::new();
            for e in self.graph.edges_directed(node, petgraph::Direction::Incoming) {
                let conn = e.weight();
                for (_, field) in &conn.fields {
                    if !driven.insert((conn.sink_port.as_str(), field.as_str())) {
                        return Err(FlowError::PortConflict {
                            actor: self.label(ActorId(node)),
                            port: conn.sink_port.clone(),
                            field: field.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Groups of actors forming cycles that no storage actor interrupts.
    ///
    /// Each group is sorted by index; groups are ordered by their first actor.
    pub fn combinational_cycles(&self) -> Vec<Vec<ActorId>> {
        let mut sub: DiGraph<NodeIndex, ()> = DiGraph::new();
        let mut map = HashMap::new();
        for n in self.graph.node_indices() {
            if !self.graph[n].actor.breaks_combinational_path() {
                map.insert(n, sub.add_node(n));
            }
        }
        for e in self.graph.edge_references() {
            if let (Some(&a), Some(&b)) = (map.get(&e.source()), map.get(&e.target())) {
                sub.update_edge(a, b, ());
            }
        }

        let mut cycles: Vec<Vec<ActorId>> = tarjan_scc(&sub)
            .into_iter()
            .filter(|scc| scc.len() > 1 || sub.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut ids: Vec<ActorId> = scc.into_iter().map(|i| ActorId(sub[i])).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Actor handles in insertion order.
    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> {
        self.graph.node_indices().map(ActorId)
    }

    /// Every connection with its endpoints.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, ActorId, ActorId, &Connection)> {
        self.graph
            .edge_references()
            .map(|e| (ConnectionId(e.id()), ActorId(e.source()), ActorId(e.target()), e.weight()))
    }

    /// Number of actors.
    pub fn actor_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of connections.
    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }
}
