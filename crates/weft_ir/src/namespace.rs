//! Resolution of scoped signal names into unique flat identifiers.

use crate::signal::{SignalDb, SignalId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unique flat names for every signal in a [`SignalDb`].
///
/// Names are the scoped name (`scope_..._name`) with characters outside
/// `[A-Za-z0-9_]` replaced by `_`. Collisions are resolved in allocation
/// order by appending `_1`, `_2`, ... to the later signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    names: Vec<String>,
}

impl Namespace {
    /// Resolves names for every signal in `db`.
    pub fn build(db: &SignalDb) -> Self {
        let mut taken = HashSet::new();
        let mut names = Vec::with_capacity(db.len());
        for signal in db.iter() {
            let base = sanitize(&signal.scoped_name());
            let mut candidate = base.clone();
            let mut n = 1;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{base}_{n}");
                n += 1;
            }
            names.push(candidate);
        }
        Self { names }
    }

    /// Returns the resolved name of a signal.
    pub fn name(&self, id: SignalId) -> &str {
        &self.names[id.as_raw() as usize]
    }

    /// Iterates `(id, name)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (SignalId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (SignalId::from_raw(i as u32), n.as_str()))
    }
}

fn sanitize(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
