//! Black-box instances of vendor primitives and external HDL modules.
//!
//! The elaborator never looks inside an instance; it only records which
//! signals are bound to which pins so the code generator can emit the
//! instantiation.

use crate::expr::Expr;
use crate::signal::{SignalId, SignalRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A parameter (generic) value passed to an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Integer parameter.
    Int(i64),
    /// String parameter.
    Str(String),
}

/// How one pin of an instance is bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinBinding {
    /// Input driven by an expression.
    Input(Expr),
    /// Output driving a signal, or left open.
    Output(Option<SignalRef>),
    /// Bidirectional pin bound to a signal.
    InOut(SignalRef),
    /// Clock input bound to a clock domain.
    Clock {
        /// Domain name.
        domain: String,
        /// Whether the clock is inverted.
        invert: bool,
    },
    /// Reset input bound to a clock domain's reset.
    Reset {
        /// Domain name.
        domain: String,
    },
}

/// A named pin binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePin {
    /// Pin name on the instantiated module.
    pub name: String,
    /// The binding.
    pub binding: PinBinding,
}

/// An instantiation of an external module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Name of the instantiated module or primitive.
    pub module: String,
    /// Optional instance name.
    pub name: Option<String>,
    /// Parameters, in declaration order.
    pub params: Vec<(String, ParamValue)>,
    /// Pin bindings, in declaration order.
    pub pins: Vec<InstancePin>,
}

impl Instance {
    /// Starts an instance of `module`.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: None,
            params: Vec::new(),
            pins: Vec::new(),
        }
    }

    /// Sets the instance name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds an integer parameter.
    pub fn param_int(mut self, name: impl Into<String>, value: i64) -> Self {
        self.params.push((name.into(), ParamValue::Int(value)));
        self
    }

    /// Adds a string parameter.
    pub fn param_str(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .push((name.into(), ParamValue::Str(value.into())));
        self
    }

    fn pin(mut self, name: impl Into<String>, binding: PinBinding) -> Self {
        self.pins.push(InstancePin {
            name: name.into(),
            binding,
        });
        self
    }

    /// Binds an input pin.
    pub fn input(self, name: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.pin(name, PinBinding::Input(value.into()))
    }

    /// Binds an output pin to a signal.
    pub fn output(self, name: impl Into<String>, target: impl Into<SignalRef>) -> Self {
        self.pin(name, PinBinding::Output(Some(target.into())))
    }

    /// Declares an output pin left unconnected.
    pub fn open_output(self, name: impl Into<String>) -> Self {
        self.pin(name, PinBinding::Output(None))
    }

    /// Binds a bidirectional pin.
    pub fn inout(self, name: impl Into<String>, target: impl Into<SignalRef>) -> Self {
        self.pin(name, PinBinding::InOut(target.into()))
    }

    /// Binds a clock pin to a domain.
    pub fn clock(self, name: impl Into<String>, domain: impl Into<String>) -> Self {
        self.pin(
            name,
            PinBinding::Clock {
                domain: domain.into(),
                invert: false,
            },
        )
    }

    /// Binds a reset pin to a domain.
    pub fn reset(self, name: impl Into<String>, domain: impl Into<String>) -> Self {
        self.pin(
            name,
            PinBinding::Reset {
                domain: domain.into(),
            },
        )
    }

    /// Signals driven by output and bidirectional pins.
    pub fn collect_driven(&self, out: &mut BTreeSet<SignalId>) {
        for pin in &self.pins {
            match &pin.binding {
                PinBinding::Output(Some(r)) | PinBinding::InOut(r) => {
                    out.insert(r.signal());
                }
                _ => {}
            }
        }
    }

    /// Every signal bound to any pin.
    pub fn collect_signals(&self, out: &mut BTreeSet<SignalId>) {
        for pin in &self.pins {
            match &pin.binding {
                PinBinding::Input(e) => e.collect_signals(out),
                PinBinding::Output(Some(r)) | PinBinding::InOut(r) => {
                    out.insert(r.signal());
                }
                PinBinding::Output(None) | PinBinding::Clock { .. } | PinBinding::Reset { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalDb;

    #[test]
    fn builder_keeps_order() {
        let mut db = SignalDb::new();
        let i = db.alloc("i", 1);
        let o = db.alloc("o", 1);
        let inst = Instance::new("IBUFDS")
            .named("rx0")
            .param_str("IOSTANDARD", "LVDS_25")
            .input("I", i)
            .output("O", o)
            .open_output("OB")
            .clock("C", "sys");
        assert_eq!(inst.name.as_deref(), Some("rx0"));
        let names: Vec<_> = inst.pins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["I", "O", "OB", "C"]);
        assert_eq!(inst.params.len(), 1);
    }

    #[test]
    fn driven_vs_all() {
        let mut db = SignalDb::new();
        let i = db.alloc("i", 1);
        let o = db.alloc("o", 1);
        let io = db.alloc("io", 1);
        let inst = Instance::new("bridge").input("a", i).output("b", o).inout("c", io);

        let mut driven = BTreeSet::new();
        inst.collect_driven(&mut driven);
        assert_eq!(driven.into_iter().collect::<Vec<_>>(), vec![o, io]);

        let mut all = BTreeSet::new();
        inst.collect_signals(&mut all);
        assert_eq!(all.len(), 3);
    }
}
