//! The actor abstraction and its elaboration context.

use crate::endpoint::Endpoints;
use crate::error::FlowError;
use std::collections::HashSet;
use weft_ir::{Circuit, SignalDb, SignalId};

/// A hardware unit with typed, handshake-controlled ports.
///
/// An actor is constructed once with its static parameters; its ports and any
/// host-visible registers are allocated at construction time. Elaboration
/// produces the actor's behaviour as a [`Circuit`] and may allocate further
/// internal signals through the [`ElabContext`]. An actor must not drive the
/// signals of other actors.
///
/// Every actor is elaborated at most once. [`elaborate_actor`] consults
/// [`Actor::is_elaborated`] before elaborating and records success through
/// [`Actor::set_elaborated`].
pub trait Actor: std::fmt::Debug {
    /// Short kind name used to build scope labels, e.g. `"buffer"`.
    fn kind(&self) -> &str;

    /// The actor's ports.
    fn endpoints(&self) -> &Endpoints;

    /// Produces the actor's circuit.
    fn elaborate(&mut self, ctx: &mut ElabContext<'_>) -> Result<Circuit, FlowError>;

    /// Whether the actor has already produced its circuit.
    fn is_elaborated(&self) -> bool;

    /// Records whether the actor has produced its circuit.
    fn set_elaborated(&mut self, done: bool);

    /// A signal that is high while the actor holds work in flight.
    fn busy(&self) -> Option<SignalId> {
        None
    }

    /// Whether every path from a sink port to a source port passes through a
    /// register. Such actors break combinational cycles.
    fn breaks_combinational_path(&self) -> bool {
        false
    }
}

/// Handed to [`Actor::elaborate`].
///
/// Signals allocated through the context are recorded as owned by the actor,
/// so the enclosing composite namespaces them together with its ports.
#[derive(Debug)]
pub struct ElabContext<'a> {
    db: &'a mut SignalDb,
    declared: Vec<SignalId>,
}

impl<'a> ElabContext<'a> {
    /// Creates a context over the session's signal database.
    pub fn new(db: &'a mut SignalDb) -> Self {
        Self {
            db,
            declared: Vec::new(),
        }
    }

    /// Allocates an internal signal with reset value 0.
    pub fn signal(&mut self, name: impl Into<String>, width: u32) -> SignalId {
        self.signal_with_reset(name, width, 0)
    }

    /// Allocates an internal signal with an explicit reset value.
    pub fn signal_with_reset(&mut self, name: impl Into<String>, width: u32, reset: u64) -> SignalId {
        let id = self.db.alloc_with_reset(name, width, reset);
        self.declared.push(id);
        id
    }

    /// Read access to every signal.
    pub fn db(&self) -> &SignalDb {
        self.db
    }

    /// Write access for nested elaboration.
    pub fn db_mut(&mut self) -> &mut SignalDb {
        self.db
    }

    fn into_declared(self) -> Vec<SignalId> {
        self.declared
    }
}

/// Elaborates one actor and completes its circuit's ownership list.
///
/// The returned circuit declares, without repetition and in this order,
/// whatever the actor declared itself, the signals allocated through the
/// context, then every port signal. Fails with
/// [`FlowError::AlreadyElaborated`] on a second call; a failed elaboration
/// leaves the actor unmarked.
pub fn elaborate_actor(actor: &mut dyn Actor, db: &mut SignalDb) -> Result<Circuit, FlowError> {
    if actor.is_elaborated() {
        return Err(FlowError::AlreadyElaborated {
            actor: actor.kind().to_string(),
        });
    }
    let mut ctx = ElabContext::new(db);
    let mut circuit = actor.elaborate(&mut ctx)?;
    actor.set_elaborated(true);
    let internal = ctx.into_declared();
    let ports = actor.endpoints().iter().flat_map(|p| p.signals());

    let mut seen = HashSet::new();
    let mut declared = Vec::new();
    for id in std::mem::take(&mut circuit.declared)
        .into_iter()
        .chain(internal)
        .chain(ports)
    {
        if seen.insert(id) {
            declared.push(id);
        }
    }
    circuit.declared = declared;
    Ok(circuit)
}
