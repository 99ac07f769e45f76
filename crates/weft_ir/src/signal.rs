//! Signals and the session-wide signal database.
//!
//! Signals are allocated once and never removed, so a [`SignalId`] stays valid
//! for the whole elaboration session. Actors allocate their port and register
//! signals at construction time and their internal signals during elaboration.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Opaque, copyable handle to a signal in a [`SignalDb`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SignalId(u32);

impl SignalId {
    /// Creates an ID from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A named wire or register.
///
/// Whether a signal becomes a flip-flop depends on whether it is assigned in a
/// synchronous block; `reset` is its value after reset in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// The handle of this signal.
    pub id: SignalId,
    /// Local name chosen by the allocating code.
    pub name: String,
    /// Width in bits, at least 1.
    pub width: u32,
    /// Reset value for registered signals.
    pub reset: u64,
    /// Enclosing scopes, outermost first.
    pub scope: Vec<String>,
}

impl Signal {
    /// Returns the scoped name, e.g. `wc0_buffer1_valid`.
    pub fn scoped_name(&self) -> String {
        if self.scope.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.scope.join("_"), self.name)
        }
    }
}

/// A reference to a whole signal or a bit range of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalRef {
    /// The full signal.
    Signal(SignalId),
    /// Bits `high..=low` of a signal.
    Slice {
        /// The sliced signal.
        signal: SignalId,
        /// High bit index (inclusive).
        high: u32,
        /// Low bit index (inclusive).
        low: u32,
    },
}

impl SignalRef {
    /// Returns the underlying signal.
    pub fn signal(self) -> SignalId {
        match self {
            SignalRef::Signal(id) | SignalRef::Slice { signal: id, .. } => id,
        }
    }

    /// Returns the referenced width.
    pub fn width(self, db: &SignalDb) -> u32 {
        match self {
            SignalRef::Signal(id) => db[id].width,
            SignalRef::Slice { high, low, .. } => high - low + 1,
        }
    }
}

impl From<SignalId> for SignalRef {
    fn from(id: SignalId) -> Self {
        SignalRef::Signal(id)
    }
}

/// Dense storage for every signal of an elaboration session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDb {
    signals: Vec<Signal>,
}

impl SignalDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a signal with reset value 0.
    ///
    /// # Panics
    ///
    /// Panics if `width` is 0.
    pub fn alloc(&mut self, name: impl Into<String>, width: u32) -> SignalId {
        self.alloc_with_reset(name, width, 0)
    }

    /// Allocates a signal with an explicit reset value.
    ///
    /// # Panics
    ///
    /// Panics if `width` is 0.
    pub fn alloc_with_reset(&mut self, name: impl Into<String>, width: u32, reset: u64) -> SignalId {
        assert!(width > 0, "signal width must be at least 1");
        let id = SignalId(self.signals.len() as u32);
        self.signals.push(Signal {
            id,
            name: name.into(),
            width,
            reset,
            scope: Vec::new(),
        });
        id
    }

    /// Returns the signal with the given ID.
    pub fn get(&self, id: SignalId) -> &Signal {
        &self.signals[id.0 as usize]
    }

    /// Returns the width of a signal.
    pub fn width(&self, id: SignalId) -> u32 {
        self.get(id).width
    }

    /// Prepends `label` to the scope of every listed signal.
    ///
    /// Callers pass each signal at most once per scoping level.
    pub fn push_scope<'a>(&mut self, ids: impl IntoIterator<Item = &'a SignalId>, label: &str) {
        for id in ids {
            self.signals[id.0 as usize].scope.insert(0, label.to_string());
        }
    }

    /// Number of allocated signals.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns `true` if nothing has been allocated.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Iterates signals in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter()
    }
}

impl Index<SignalId> for SignalDb {
    type Output = Signal;

    fn index(&self, id: SignalId) -> &Signal {
        self.get(id)
    }
}
