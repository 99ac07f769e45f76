//! Expression trees over signals.

use crate::signal::{SignalDb, SignalId, SignalRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise NOT.
    Not,
    /// OR of all bits.
    ReduceOr,
    /// AND of all bits.
    ReduceAnd,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Equality, 1-bit result.
    Eq,
    /// Inequality, 1-bit result.
    Ne,
    /// Unsigned less-than, 1-bit result.
    Lt,
}

impl BinaryOp {
    fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt)
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// A signal or bit range.
    Ref(SignalRef),
    /// A constant.
    Const {
        /// The value, truncated to `width`.
        value: u64,
        /// Width in bits.
        width: u32,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `condition ? when_true : when_false`.
    Mux {
        /// 1-bit select.
        condition: Box<Expr>,
        /// Value when the select is 1.
        when_true: Box<Expr>,
        /// Value when the select is 0.
        when_false: Box<Expr>,
    },
    /// Concatenation, most significant part first.
    Concat(Vec<Expr>),
}

impl Expr {
    /// A whole signal.
    pub fn signal(id: SignalId) -> Self {
        Expr::Ref(SignalRef::Signal(id))
    }

    /// Bits `high..=low` of a signal.
    pub fn slice(signal: SignalId, high: u32, low: u32) -> Self {
        Expr::Ref(SignalRef::Slice { signal, high, low })
    }

    /// A constant of the given width.
    pub fn constant(value: u64, width: u32) -> Self {
        let mask = if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        Expr::Const {
            value: value & mask,
            width,
        }
    }

    /// A 1-bit constant.
    pub fn bit(value: bool) -> Self {
        Expr::constant(value as u64, 1)
    }

    /// Bitwise NOT.
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    fn binary(self, op: BinaryOp, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    /// Bitwise AND.
    pub fn and(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, rhs.into())
    }

    /// Bitwise OR.
    pub fn or(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, rhs.into())
    }

    /// Bitwise XOR.
    pub fn xor(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Xor, rhs.into())
    }

    /// Wrapping addition.
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Add, rhs.into())
    }

    /// Wrapping subtraction.
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Sub, rhs.into())
    }

    /// Equality comparison.
    pub fn equals(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, rhs.into())
    }

    /// Inequality comparison.
    pub fn not_equals(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ne, rhs.into())
    }

    /// Unsigned less-than.
    pub fn less_than(self, rhs: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, rhs.into())
    }

    /// Two-way multiplexer with `self` as the select.
    pub fn select(self, when_true: impl Into<Expr>, when_false: impl Into<Expr>) -> Self {
        Expr::Mux {
            condition: Box::new(self),
            when_true: Box::new(when_true.into()),
            when_false: Box::new(when_false.into()),
        }
    }

    /// AND of all terms; a constant 1 when there are none.
    pub fn all(terms: impl IntoIterator<Item = Expr>) -> Self {
        terms
            .into_iter()
            .reduce(|acc, t| acc.and(t))
            .unwrap_or_else(|| Expr::bit(true))
    }

    /// OR of all terms; a constant 0 when there are none.
    pub fn any(terms: impl IntoIterator<Item = Expr>) -> Self {
        terms
            .into_iter()
            .reduce(|acc, t| acc.or(t))
            .unwrap_or_else(|| Expr::bit(false))
    }

    /// Result width of the expression.
    pub fn width(&self, db: &SignalDb) -> u32 {
        match self {
            Expr::Ref(r) => r.width(db),
            Expr::Const { width, .. } => *width,
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => operand.width(db),
                UnaryOp::ReduceOr | UnaryOp::ReduceAnd => 1,
            },
            Expr::Binary { op, lhs, rhs } => {
                if op.is_comparison() {
                    1
                } else {
                    lhs.width(db).max(rhs.width(db))
                }
            }
            Expr::Mux {
                when_true,
                when_false,
                ..
            } => when_true.width(db).max(when_false.width(db)),
            Expr::Concat(parts) => parts.iter().map(|p| p.width(db)).sum(),
        }
    }

    /// Collects every signal read by the expression.
    pub fn collect_signals(&self, out: &mut BTreeSet<SignalId>) {
        match self {
            Expr::Ref(r) => {
                out.insert(r.signal());
            }
            Expr::Const { .. } => {}
            Expr::Unary { operand, .. } => operand.collect_signals(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_signals(out);
                rhs.collect_signals(out);
            }
            Expr::Mux {
                condition,
                when_true,
                when_false,
            } => {
                condition.collect_signals(out);
                when_true.collect_signals(out);
                when_false.collect_signals(out);
            }
            Expr::Concat(parts) => {
                for p in parts {
                    p.collect_signals(out);
                }
            }
        }
    }
}

impl From<SignalId> for Expr {
    fn from(id: SignalId) -> Self {
        Expr::signal(id)
    }
}

impl From<SignalRef> for Expr {
    fn from(r: SignalRef) -> Self {
        Expr::Ref(r)
    }
}
