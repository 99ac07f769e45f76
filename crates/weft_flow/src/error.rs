//! Error types for layouts, graph construction and flattening.

use crate::endpoint::Direction;

/// Errors raised while describing or flattening a dataflow graph.
///
/// Actors are identified by their graph label (`<kind><index>`), so a failure
/// deep inside a nested composite still names the offending constituent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// A layout declares the same field name twice.
    #[error("duplicate field '{field}' in layout")]
    DuplicateField {
        /// The repeated field name.
        field: String,
    },

    /// A layout field has width 0.
    #[error("field '{field}' has zero width")]
    ZeroWidthField {
        /// The offending field name.
        field: String,
    },

    /// The two sides of a connection do not line up.
    #[error("layout mismatch on {connection}: {reason}")]
    LayoutMismatch {
        /// `source.port -> sink.port`.
        connection: String,
        /// What does not match.
        reason: String,
    },

    /// A named port does not exist on the actor.
    #[error("actor '{actor}' has no port '{port}'")]
    UnknownPort {
        /// Actor label.
        actor: String,
        /// Requested port name.
        port: String,
    },

    /// A port was omitted but the actor has zero or several ports of that direction.
    #[error("actor '{actor}' has {count} {direction} ports; name one explicitly")]
    AmbiguousPort {
        /// Actor label.
        actor: String,
        /// The direction looked up.
        direction: Direction,
        /// How many ports of that direction exist.
        count: usize,
    },

    /// A sink field would be driven by more than one connection.
    #[error("field '{field}' of {actor}.{port} is driven by more than one connection")]
    PortConflict {
        /// Actor label.
        actor: String,
        /// Sink port name.
        port: String,
        /// Sink field name.
        field: String,
    },

    /// A field cannot be cut into equal parts.
    #[error("field '{field}' of {width} bits does not split into {parts} equal parts")]
    UnevenSplit {
        /// The packed field.
        field: String,
        /// Its width.
        width: u32,
        /// Requested number of parts.
        parts: u32,
    },

    /// A required actor's port is not fully connected.
    #[error("port {actor}.{port} is not connected")]
    UnconnectedPort {
        /// Actor label.
        actor: String,
        /// Port name.
        port: String,
    },

    /// An actor was asked to elaborate a second time.
    #[error("actor '{actor}' has already been elaborated")]
    AlreadyElaborated {
        /// Actor label.
        actor: String,
    },

    /// A cycle passes only through actors without storage.
    #[error("combinational cycle through {}", .actors.join(" -> "))]
    CombinationalCycle {
        /// Labels of the actors on the cycle.
        actors: Vec<String>,
    },

    /// An `ActorId` does not belong to this graph.
    #[error("no actor with index {index} in this graph")]
    UnknownActor {
        /// The raw node index.
        index: usize,
    },
}
