//! Dataflow composition of handshake-controlled hardware actors.
//!
//! Actors expose typed [`Endpoint`]s whose payload follows a [`Layout`].
//! A [`DataflowGraph`] records which source port feeds which sink port, with
//! optional sub-field routing, and validates layouts and single writers as
//! connections are added. A [`CompositeActor`] flattens a graph into one
//! [`Circuit`](weft_ir::Circuit), generating the stb/ack glue for plain,
//! fork and join connections and namespacing each constituent's signals.

#![warn(missing_docs)]

pub mod actor;
pub mod composite;
pub mod endpoint;
pub mod error;
pub mod graph;
pub mod layout;
pub mod plumbing;

#[cfg(test)]
pub(crate) mod testing;

pub use actor::{elaborate_actor, Actor, ElabContext};
pub use composite::{CompositeActor, CyclePolicy};
pub use endpoint::{Direction, Endpoint, Endpoints, Token};
pub use error::FlowError;
pub use graph::{ActorId, Connection, ConnectionId, DataflowGraph, Route};
pub use layout::{Field, Layout};
pub use plumbing::{Buffer, Unpack};
