//! Statements used in combinational and synchronous blocks.

use crate::expr::Expr;
use crate::signal::{SignalId, SignalRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A behavioural statement.
///
/// In a combinational block an assignment is continuous; in a synchronous
/// block it takes effect on the next active clock edge. Later assignments to
/// the same target win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    /// `target = value`.
    Assign {
        /// The assigned signal or bit range.
        target: SignalRef,
        /// The assigned value.
        value: Expr,
    },
    /// Conditional execution.
    If {
        /// 1-bit condition.
        condition: Expr,
        /// Statements run when the condition is 1.
        then_body: Vec<Stmt>,
        /// Statements run otherwise.
        else_body: Vec<Stmt>,
    },
}

impl Stmt {
    /// Builds an assignment.
    pub fn assign(target: impl Into<SignalRef>, value: impl Into<Expr>) -> Self {
        Stmt::Assign {
            target: target.into(),
            value: value.into(),
        }
    }

    /// Builds an `if` without an `else`.
    pub fn when(condition: Expr, then_body: Vec<Stmt>) -> Self {
        Stmt::If {
            condition,
            then_body,
            else_body: Vec::new(),
        }
    }

    /// Attaches an `else` branch to an `if`; other statements are returned unchanged.
    pub fn otherwise(self, body: Vec<Stmt>) -> Self {
        match self {
            Stmt::If {
                condition,
                then_body,
                ..
            } => Stmt::If {
                condition,
                then_body,
                else_body: body,
            },
            other => other,
        }
    }

    /// Collects the signals assigned anywhere in this statement.
    pub fn collect_targets(&self, out: &mut BTreeSet<SignalId>) {
        match self {
            Stmt::Assign { target, .. } => {
                out.insert(target.signal());
            }
            Stmt::If {
                then_body,
                else_body,
                ..
            } => {
                for s in then_body.iter().chain(else_body) {
                    s.collect_targets(out);
                }
            }
        }
    }

    /// Collects every signal read or written by this statement.
    pub fn collect_signals(&self, out: &mut BTreeSet<SignalId>) {
        match self {
            Stmt::Assign { target, value } => {
                out.insert(target.signal());
                value.collect_signals(out);
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => {
                condition.collect_signals(out);
                for s in then_body.iter().chain(else_body) {
                    s.collect_signals(out);
                }
            }
        }
    }
}
