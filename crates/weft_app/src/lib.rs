//! Assembly of complete applications from configured components.
//!
//! A [`BaseApp`] owns the signal database and every allocator of a design. It
//! builds the clock generator and then each configured component through the
//! [`ComponentRegistry`]; components request pins, register groups and streams
//! as they are built. [`BaseApp::elaborate`] adds the host bus bridge, wires
//! the CSR decoder behind it and flattens everything into an [`Artifact`] for
//! the external code generator.

#![warn(missing_docs)]

pub mod app;
pub mod artifact;
pub mod bridge;
pub mod component;
pub mod context;
pub mod crg;
pub mod error;
pub mod library;
pub mod registry;

pub use app::BaseApp;
pub use artifact::{Artifact, NamedSignal};
pub use bridge::{BusBridge, BRIDGE_MODULE};
pub use component::{Component, ComponentSpec, FlowComponent};
pub use context::BuildContext;
pub use crg::Crg;
pub use error::AppError;
pub use registry::{ComponentFactory, ComponentRegistry};
