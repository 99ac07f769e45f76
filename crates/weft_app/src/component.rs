//! The component abstraction and its configuration view.

use crate::error::AppError;
use std::fmt;
use tracing::debug;
use weft_config::ComponentDef;
use weft_flow::{elaborate_actor, Actor};
use weft_ir::{Circuit, SignalDb};

/// A top-level building block of a base application.
///
/// Components are constructed by a factory while the application is being
/// assembled; that is when they request pins, register groups and streams.
/// Elaboration happens later, once for every component.
pub trait Component: fmt::Debug {
    /// The name the component was configured with, or a generated label.
    fn name(&self) -> &str;

    /// The registry kind the component was built from.
    fn kind(&self) -> &str;

    /// Produces the component's circuit.
    fn elaborate(&mut self, db: &mut SignalDb) -> Result<Circuit, AppError>;
}

/// What a factory receives about the component to build.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    /// Registry kind.
    pub kind: String,
    /// Explicit name from the configuration.
    pub name: Option<String>,
    /// Position in the configured component list.
    pub index: usize,
    /// Kind-specific parameters.
    pub params: toml::Table,
}

impl ComponentSpec {
    /// Builds the spec for the `index`-th configured component.
    pub fn from_def(def: &ComponentDef, index: usize) -> Self {
        Self {
            kind: def.kind.clone(),
            name: def.name.clone(),
            index,
            params: def.params.clone(),
        }
    }

    /// The explicit name, or `<kind><index>` for unnamed components.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}{}", self.kind, self.index),
        }
    }

    /// An unsigned integer parameter.
    pub fn param_u32(&self, key: &str, default: u32) -> Result<u32, AppError> {
        match self.params.get(key) {
            None => Ok(default),
            Some(toml::Value::Integer(v)) => {
                u32::try_from(*v).map_err(|_| self.invalid(key, format!("is out of range: {v}")))
            }
            Some(_) => Err(self.invalid(key, "must be an integer".into())),
        }
    }

    /// A string parameter.
    pub fn param_str(&self, key: &str, default: &str) -> Result<String, AppError> {
        match self.params.get(key) {
            None => Ok(default.to_string()),
            Some(toml::Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.invalid(key, "must be a string".into())),
        }
    }

    /// A boolean parameter.
    pub fn param_bool(&self, key: &str, default: bool) -> Result<bool, AppError> {
        match self.params.get(key) {
            None => Ok(default),
            Some(toml::Value::Boolean(b)) => Ok(*b),
            Some(_) => Err(self.invalid(key, "must be a boolean".into())),
        }
    }

    fn invalid(&self, key: &str, reason: String) -> AppError {
        AppError::InvalidParam {
            component: self.label(),
            param: key.to_string(),
            reason,
        }
    }
}

/// A component whose behaviour is a single actor, usually a composite.
///
/// The actor's signals are scoped with the component name.
#[derive(Debug)]
pub struct FlowComponent {
    name: String,
    kind: String,
    actor: Box<dyn Actor>,
}

impl FlowComponent {
    /// Wraps an actor.
    pub fn new(name: impl Into<String>, kind: impl Into<String>, actor: impl Actor + 'static) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            actor: Box::new(actor),
        }
    }

    /// The wrapped actor.
    pub fn actor(&self) -> &dyn Actor {
        self.actor.as_ref()
    }
}

impl Component for FlowComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn elaborate(&mut self, db: &mut SignalDb) -> Result<Circuit, AppError> {
        let circuit = elaborate_actor(self.actor.as_mut(), db)?;
        db.push_scope(&circuit.declared, &self.name);
        debug!(component = %self.name, signals = circuit.declared.len(), "elaborated component");
        Ok(circuit)
    }
}
