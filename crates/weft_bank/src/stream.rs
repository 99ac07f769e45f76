//! DMA stream endpoints and their address windows.

use crate::error::BankError;
use crate::symtab::{SymbolEntry, SymbolKind};
use serde::{Deserialize, Serialize};
use tracing::debug;
use weft_flow::{Actor, Direction, ElabContext, Endpoint, Endpoints, FlowError, Layout};
use weft_ir::{Circuit, SignalDb};

/// Payload field carried by every stream.
pub const STREAM_FIELD: &str = "data";

/// Which way a stream moves data relative to the fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamDirection {
    /// Host to fabric. Inside the fabric the stream is a source.
    FromExternal,
    /// Fabric to host. Inside the fabric the stream is a sink.
    ToExternal,
}

impl StreamDirection {
    fn port_direction(self) -> Direction {
        match self {
            StreamDirection::FromExternal => Direction::Source,
            StreamDirection::ToExternal => Direction::Sink,
        }
    }

    fn symbol_kind(self) -> SymbolKind {
        match self {
            StreamDirection::FromExternal => SymbolKind::StreamFrom,
            StreamDirection::ToExternal => SymbolKind::StreamTo,
        }
    }
}

/// A requested stream as seen by the bus bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEndpoint {
    /// Stream name.
    pub name: String,
    /// Transfer direction.
    pub direction: StreamDirection,
    /// The port shared with the requesting component's graph.
    pub endpoint: Endpoint,
}

/// Hands out stream endpoints up to the bridge's capacity.
///
/// Capacity counts both directions together.
#[derive(Debug)]
pub struct StreamManager {
    data_width: u32,
    capacity: usize,
    streams: Vec<StreamEndpoint>,
}

impl StreamManager {
    /// Creates a manager for streams `data_width` bits wide.
    pub fn new(data_width: u32, capacity: usize) -> Self {
        Self {
            data_width,
            capacity,
            streams: Vec::new(),
        }
    }

    /// Requests a stream and returns the actor that exposes it to a graph.
    pub fn request(
        &mut self,
        db: &mut SignalDb,
        name: impl Into<String>,
        direction: StreamDirection,
    ) -> Result<StreamActor, BankError> {
        let name = name.into();
        if self.streams.iter().any(|s| s.name == name) {
            return Err(BankError::DuplicateStreamName { name });
        }
        if self.streams.len() >= self.capacity {
            return Err(BankError::StreamCapacityExceeded {
                name,
                capacity: self.capacity,
            });
        }
        let layout = Layout::single(STREAM_FIELD, self.data_width)?;
        let endpoint = Endpoint::new(db, name.clone(), direction.port_direction(), layout);
        debug!(stream = %name, ?direction, "allocated stream endpoint");
        self.streams.push(StreamEndpoint {
            name,
            direction,
            endpoint: endpoint.clone(),
        });
        Ok(StreamActor {
            ports: Endpoints::new().with(endpoint),
            elaborated: false,
        })
    }

    /// Streams of one direction in request order.
    pub fn ports(&self, direction: StreamDirection) -> impl Iterator<Item = &StreamEndpoint> {
        self.streams.iter().filter(move |s| s.direction == direction)
    }

    /// Streams requested so far.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no stream has been requested.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Maximum number of streams.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stream data width in bits.
    pub fn data_width(&self) -> u32 {
        self.data_width
    }

    /// One entry per stream: host-to-fabric streams first, then
    /// fabric-to-host, each in request order. Window `i` starts at
    /// `base + i * port_range`.
    ///
    /// Fails if the last window ends beyond the 64-bit address space.
    pub fn symtab(&self, base: u64, port_range: u64) -> Result<Vec<SymbolEntry>, BankError> {
        let count = self.streams.len() as u64;
        let needed = count.checked_mul(port_range);
        if needed.and_then(|n| base.checked_add(n)).is_none() {
            return Err(BankError::RegionOverflow {
                kind: "stream",
                needed: needed.unwrap_or(u64::MAX),
                span: u64::MAX - base,
            });
        }
        Ok(self
            .ports(StreamDirection::FromExternal)
            .chain(self.ports(StreamDirection::ToExternal))
            .enumerate()
            .map(|(i, s)| SymbolEntry {
                name: s.name.clone(),
                kind: s.direction.symbol_kind(),
                base: base + i as u64 * port_range,
                size: port_range,
                uid: None,
            })
            .collect())
    }
}

/// Exposes a stream endpoint as a graph actor.
///
/// The bus bridge drives the port's external side, so the actor itself adds
/// no logic.
#[derive(Debug)]
pub struct StreamActor {
    ports: Endpoints,
    elaborated: bool,
}

impl StreamActor {
    /// The stream port.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.ports.iter().next()
    }
}

impl Actor for StreamActor {
    fn kind(&self) -> &str {
        "stream"
    }

    fn endpoints(&self) -> &Endpoints {
        &self.ports
    }

    fn elaborate(&mut self, _ctx: &mut ElabContext<'_>) -> Result<Circuit, FlowError> {
        Ok(Circuit::new())
    }

    fn is_elaborated(&self) -> bool {
        self.elaborated
    }

    fn set_elaborated(&mut self, done: bool) {
        self.elaborated = done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_counts_both_directions() {
        let mut db = SignalDb::new();
        let mut streams = StreamManager::new(16, 3);
        streams.request(&mut db, "a", StreamDirection::FromExternal).unwrap();
        streams.request(&mut db, "b", StreamDirection::ToExternal).unwrap();
        streams.request(&mut db, "c", StreamDirection::FromExternal).unwrap();
        assert_eq!(streams.len(), 3);
        let err = streams
            .request(&mut db, "d", StreamDirection::ToExternal)
            .unwrap_err();
        assert_eq!(
            err,
            BankError::StreamCapacityExceeded {
                name: "d".into(),
                capacity: 3
            }
        );
        assert_eq!(streams.len(), 3);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut db = SignalDb::new();
        let mut streams = StreamManager::new(16, 8);
        streams.request(&mut db, "a", StreamDirection::FromExternal).unwrap();
        assert!(matches!(
            streams.request(&mut db, "a", StreamDirection::ToExternal),
            Err(BankError::DuplicateStreamName { .. })
        ));
    }

    #[test]
    fn port_direction_and_layout() {
        let mut db = SignalDb::new();
        let mut streams = StreamManager::new(12, 8);
        let from = streams.request(&mut db, "in", StreamDirection::FromExternal).unwrap();
        let to = streams.request(&mut db, "out", StreamDirection::ToExternal).unwrap();
        let from = from.endpoint().unwrap();
        assert_eq!(from.direction(), Direction::Source);
        assert_eq!(from.layout().width(), 12);
        assert_eq!(to.endpoint().unwrap().direction(), Direction::Sink);

        let shared = &streams.ports(StreamDirection::FromExternal).next().unwrap().endpoint;
        assert_eq!(shared, from);
    }

    #[test]
    fn symtab_orders_from_external_first() {
        let mut db = SignalDb::new();
        let mut streams = StreamManager::new(16, 8);
        streams.request(&mut db, "out0", StreamDirection::ToExternal).unwrap();
        streams.request(&mut db, "in0", StreamDirection::FromExternal).unwrap();
        streams.request(&mut db, "in1", StreamDirection::FromExternal).unwrap();
        let tab = streams.symtab(0x1000_0000, 0x2000).unwrap();
        let rows: Vec<_> = tab.iter().map(|e| (e.name.as_str(), e.kind, e.base)).collect();
        assert_eq!(
            rows,
            vec![
                ("in0", SymbolKind::StreamFrom, 0x1000_0000),
                ("in1", SymbolKind::StreamFrom, 0x1000_2000),
                ("out0", SymbolKind::StreamTo, 0x1000_4000),
            ]
        );
        assert!(tab.iter().all(|e| e.size == 0x2000 && e.uid.is_none()));
    }

    #[test]
    fn symtab_windows_past_address_limit() {
        let mut db = SignalDb::new();
        let mut streams = StreamManager::new(16, 4);
        streams.request(&mut db, "a", StreamDirection::FromExternal).unwrap();
        streams.request(&mut db, "b", StreamDirection::ToExternal).unwrap();
        assert_eq!(
            streams.symtab(u64::MAX - 0x2000, 0x2000),
            Err(BankError::RegionOverflow {
                kind: "stream",
                needed: 0x4000,
                span: 0x2000
            })
        );
        assert!(streams.symtab(0, u64::MAX).is_err());
        let tab = streams.symtab(u64::MAX - 0x4000, 0x2000).unwrap();
        assert_eq!(tab[1].end(), u64::MAX);
    }

    #[test]
    fn stream_actor_adds_no_logic() {
        let mut db = SignalDb::new();
        let mut streams = StreamManager::new(16, 1);
        let mut actor = streams.request(&mut db, "s", StreamDirection::ToExternal).unwrap();
        let c = weft_flow::elaborate_actor(&mut actor, &mut db).unwrap();
        assert!(c.comb.is_empty() && c.sync.is_empty());
        assert_eq!(c.declared.len(), 3);
        assert_eq!(
            weft_flow::elaborate_actor(&mut actor, &mut db),
            Err(FlowError::AlreadyElaborated {
                actor: "stream".into()
            })
        );
    }
}
