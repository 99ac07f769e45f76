//! Circuit fragments and their merging.

use crate::instance::Instance;
use crate::signal::{SignalDb, SignalId};
use crate::stmt::Stmt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use weft_common::{ContentHash, Fingerprinter};

/// A fragment of hardware behaviour.
///
/// Fragments reference signals of a shared [`SignalDb`] by ID, so merging two
/// fragments is plain concatenation. `declared` lists the signals the fragment
/// owns; enclosing composites use it to namespace them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    /// Continuous assignments.
    pub comb: Vec<Stmt>,
    /// Clocked statements, keyed by clock domain name.
    pub sync: BTreeMap<String, Vec<Stmt>>,
    /// Black-box instances.
    pub instances: Vec<Instance>,
    /// Signals owned by this fragment.
    pub declared: Vec<SignalId>,
}

impl Circuit {
    /// Creates an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a combinational statement.
    pub fn comb(&mut self, stmt: Stmt) -> &mut Self {
        self.comb.push(stmt);
        self
    }

    /// Appends a synchronous statement to a clock domain.
    pub fn sync(&mut self, domain: &str, stmt: Stmt) -> &mut Self {
        self.sync.entry(domain.to_string()).or_default().push(stmt);
        self
    }

    /// Adds a black-box instance.
    pub fn instance(&mut self, inst: Instance) -> &mut Self {
        self.instances.push(inst);
        self
    }

    /// Records a signal as owned by this fragment.
    pub fn declare(&mut self, id: SignalId) -> &mut Self {
        self.declared.push(id);
        self
    }

    /// Appends all of `other` to this fragment, keeping statement order.
    pub fn merge(&mut self, other: Circuit) {
        self.comb.extend(other.comb);
        for (domain, stmts) in other.sync {
            self.sync.entry(domain).or_default().extend(stmts);
        }
        self.instances.extend(other.instances);
        self.declared.extend(other.declared);
    }

    /// Returns `true` if the fragment contains no behaviour and owns no signals.
    pub fn is_empty(&self) -> bool {
        self.comb.is_empty()
            && self.sync.values().all(Vec::is_empty)
            && self.instances.is_empty()
            && self.declared.is_empty()
    }

    /// Names of the clock domains this fragment uses.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.sync
            .iter()
            .filter(|(_, stmts)| !stmts.is_empty())
            .map(|(d, _)| d.as_str())
    }

    /// Signals assigned by combinational statements.
    pub fn comb_targets(&self) -> BTreeSet<SignalId> {
        let mut out = BTreeSet::new();
        for s in &self.comb {
            s.collect_targets(&mut out);
        }
        out
    }

    /// Signals assigned by synchronous statements in any domain.
    pub fn sync_targets(&self) -> BTreeSet<SignalId> {
        let mut out = BTreeSet::new();
        for s in self.sync.values().flatten() {
            s.collect_targets(&mut out);
        }
        out
    }

    /// Every signal referenced or owned by the fragment.
    pub fn signals(&self) -> BTreeSet<SignalId> {
        let mut out: BTreeSet<SignalId> = self.declared.iter().copied().collect();
        for s in self.comb.iter().chain(self.sync.values().flatten()) {
            s.collect_signals(&mut out);
        }
        for inst in &self.instances {
            inst.collect_signals(&mut out);
        }
        out
    }

    /// Structural fingerprint of the fragment and of every signal it touches.
    ///
    /// Two elaborations of the same description produce equal fingerprints.
    pub fn fingerprint(&self, db: &SignalDb) -> Result<ContentHash, bincode::error::EncodeError> {
        let config = bincode::config::standard();
        let mut fp = Fingerprinter::new();
        fp.part(&bincode::serde::encode_to_vec(self, config)?);
        for id in self.signals() {
            fp.part(&bincode::serde::encode_to_vec(db.get(id), config)?);
        }
        Ok(fp.finish())
    }
}

impl AddAssign for Circuit {
    fn add_assign(&mut self, rhs: Circuit) {
        self.merge(rhs);
    }
}

impl Add for Circuit {
    type Output = Circuit;

    fn add(mut self, rhs: Circuit) -> Circuit {
        self.merge(rhs);
        self
    }
}

impl Sum for Circuit {
    fn sum<I: Iterator<Item = Circuit>>(iter: I) -> Circuit {
        iter.fold(Circuit::new(), Add::add)
    }
}
