//! Handshake-controlled ports and the structured token view over them.

use crate::layout::Layout;
use serde::{Deserialize, Serialize};
use std::fmt;
use weft_ir::{Expr, SignalDb, SignalId};

/// Which side of a transfer a port is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The actor produces tokens: it drives `stb` and the payload.
    Source,
    /// The actor consumes tokens: it drives `ack`.
    Sink,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Source => write!(f, "source"),
            Direction::Sink => write!(f, "sink"),
        }
    }
}

/// A port of an actor.
///
/// A transfer commits on every cycle where both `stb` and `ack` are high.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    name: String,
    direction: Direction,
    layout: Layout,
    stb: SignalId,
    ack: SignalId,
    fields: Vec<SignalId>,
}

impl Endpoint {
    /// Creates a port and allocates its handshake and payload signals.
    ///
    /// Signals are named `<port>_stb`, `<port>_ack` and `<port>_<field>`.
    pub fn new(db: &mut SignalDb, name: impl Into<String>, direction: Direction, layout: Layout) -> Self {
        let name = name.into();
        let stb = db.alloc(format!("{name}_stb"), 1);
        let ack = db.alloc(format!("{name}_ack"), 1);
        let fields = layout
            .fields()
            .iter()
            .map(|f| db.alloc(format!("{name}_{}", f.name), f.width))
            .collect();
        Self {
            name,
            direction,
            layout,
            stb,
            ack,
            fields,
        }
    }

    /// Port name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Port direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Payload layout.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The producer-driven strobe.
    pub fn stb(&self) -> SignalId {
        self.stb
    }

    /// The consumer-driven acknowledge.
    pub fn ack(&self) -> SignalId {
        self.ack
    }

    /// The signal of a payload field.
    pub fn field(&self, name: &str) -> Option<SignalId> {
        self.layout.position(name).map(|i| self.fields[i])
    }

    /// Payload field signals in layout order.
    pub fn fields(&self) -> &[SignalId] {
        &self.fields
    }

    /// The structured view over the payload.
    pub fn token(&self) -> Token<'_> {
        Token { endpoint: self }
    }

    /// The whole payload, first field in the least significant bits.
    pub fn payload(&self) -> Expr {
        Expr::Concat(self.fields.iter().rev().map(|s| Expr::signal(*s)).collect())
    }

    /// `stb & ack`: high on cycles where a transfer commits.
    pub fn fire(&self) -> Expr {
        Expr::signal(self.stb).and(self.ack)
    }

    /// Every signal of the port: `stb`, `ack`, then the payload fields.
    pub fn signals(&self) -> Vec<SignalId> {
        let mut out = vec![self.stb, self.ack];
        out.extend_from_slice(&self.fields);
        out
    }
}

/// Field-by-name access to a port's payload.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    endpoint: &'a Endpoint,
}

impl<'a> Token<'a> {
    /// The signal carrying a field.
    pub fn field(&self, name: &str) -> Option<SignalId> {
        self.endpoint.field(name)
    }

    /// The layout the token follows.
    pub fn layout(&self) -> &'a Layout {
        &self.endpoint.layout
    }

    /// `(field name, signal)` pairs in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, SignalId)> + 'a {
        let ep = self.endpoint;
        ep.layout.names().zip(ep.fields.iter().copied())
    }
}

/// The ordered port set of an actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    ports: Vec<Endpoint>,
}

impl Endpoints {
    /// An empty port set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a port.
    pub fn with(mut self, endpoint: Endpoint) -> Self {
        self.ports.push(endpoint);
        self
    }

    /// Looks up a port by name.
    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// The token view of a port.
    pub fn token(&self, name: &str) -> Option<Token<'_>> {
        self.get(name).map(Endpoint::token)
    }

    /// The only port of a direction, or `None` if there are zero or several.
    pub fn sole(&self, direction: Direction) -> Option<&Endpoint> {
        let mut it = self.of(direction);
        match (it.next(), it.next()) {
            (Some(p), None) => Some(p),
            _ => None,
        }
    }

    /// Ports of one direction, in declared order.
    pub fn of(&self, direction: Direction) -> impl Iterator<Item = &Endpoint> {
        self.ports.iter().filter(move |p| p.direction == direction)
    }

    /// All ports in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.ports.iter()
    }

    /// Number of ports.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Returns `true` if the actor has no ports.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}
