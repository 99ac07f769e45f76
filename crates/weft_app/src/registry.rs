//! Component kinds available to configurations.

use crate::component::{Component, ComponentSpec};
use crate::context::BuildContext;
use crate::error::AppError;
use crate::library;
use std::collections::BTreeMap;

/// Builds one component. Called once per configured instance.
pub type ComponentFactory = fn(&mut BuildContext, &ComponentSpec) -> Result<Box<dyn Component>, AppError>;

/// Maps kind names to factories.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled component library.
    pub fn with_library() -> Self {
        let mut registry = Self::new();
        registry.register(library::WAVEFORM_COLLECTOR, library::waveform_collector);
        registry.register(library::WAVEFORM_PLAYER, library::waveform_player);
        registry
    }

    /// Registers a factory, replacing any previous one for the kind.
    pub fn register(&mut self, kind: impl Into<String>, factory: ComponentFactory) -> &mut Self {
        self.factories.insert(kind.into(), factory);
        self
    }

    /// Looks up the factory for a kind.
    pub fn get(&self, kind: &str) -> Result<ComponentFactory, AppError> {
        self.factories
            .get(kind)
            .copied()
            .ok_or_else(|| AppError::UnknownComponentKind {
                kind: kind.to_string(),
            })
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
