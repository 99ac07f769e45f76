//! Assembly and elaboration of a complete application.

use crate::artifact::{Artifact, ArtifactParts};
use crate::bridge::BusBridge;
use crate::component::{Component, ComponentSpec};
use crate::context::BuildContext;
use crate::crg::Crg;
use crate::error::AppError;
use crate::registry::ComponentRegistry;
use std::collections::HashSet;
use tracing::{debug, info};
use weft_bank::SymbolEntry;
use weft_config::AppConfig;
use weft_ir::{ClockDomain, SignalDb};

/// The top level of a design: platform, clocking, bus bridge and components.
///
/// Construction runs every component factory in configuration order, so
/// register groups and streams are allocated in that order too.
#[derive(Debug)]
pub struct BaseApp {
    config: AppConfig,
    ctx: BuildContext,
    crg: Crg,
    components: Vec<Box<dyn Component>>,
}

impl BaseApp {
    /// Builds the clock generator and every configured component.
    pub fn new(config: AppConfig, registry: &ComponentRegistry) -> Result<Self, AppError> {
        let mut ctx = BuildContext::new(&config);
        let crg = Crg::new(&mut ctx, &config.clocks)?;
        ctx.set_domains(crg.domains().to_vec());

        let mut names = HashSet::new();
        let mut components = Vec::with_capacity(config.components.len());
        for (index, def) in config.components.iter().enumerate() {
            let spec = ComponentSpec::from_def(def, index);
            let label = spec.label();
            if !names.insert(label.clone()) {
                return Err(AppError::DuplicateComponentName { name: label });
            }
            let factory = registry.get(&spec.kind)?;
            let component = factory(&mut ctx, &spec)?;
            debug!(component = %label, kind = %spec.kind, "built component");
            components.push(component);
        }
        info!(
            app = %config.app.name,
            components = components.len(),
            groups = ctx.csrs.allocations().len(),
            streams = ctx.streams.len(),
            "assembled application"
        );
        Ok(Self {
            config,
            ctx,
            crg,
            components,
        })
    }

    /// Application name.
    pub fn name(&self) -> &str {
        &self.config.app.name
    }

    /// Looks up a component by name.
    pub fn component(&self, name: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    /// Components in configuration order.
    pub fn components(&self) -> impl Iterator<Item = &dyn Component> {
        self.components.iter().map(|c| c.as_ref())
    }

    /// The clock domains.
    pub fn clock_domains(&self) -> &[ClockDomain] {
        self.crg.domains()
    }

    /// Shared build state.
    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// The signal database.
    pub fn db(&self) -> &SignalDb {
        &self.ctx.db
    }

    /// The address map: register groups first, then streams.
    pub fn symtab(&self) -> Result<Vec<SymbolEntry>, AppError> {
        let bus = self.ctx.bus();
        let mut symtab = self.ctx.csrs.symtab(bus.csr_base, bus.csr_span)?;
        symtab.extend(self.ctx.streams.symtab(bus.dma_base, bus.dma_port_range)?);
        Ok(symtab)
    }

    /// Builds the bus bridge and flattens everything into one artifact.
    pub fn elaborate(mut self) -> Result<Artifact, AppError> {
        let symtab = self.symtab()?;

        let bridge = BusBridge::new(&mut self.ctx)?;
        self.ctx.csrs.attach_master(bridge.csr());

        let mut circuit = self.ctx.csrs.fragment(&self.ctx.db)?;
        circuit += bridge.fragment();
        circuit += self.crg.elaborate(&mut self.ctx.db)?;
        for component in &mut self.components {
            circuit += component.elaborate(&mut self.ctx.db)?;
        }
        info!(
            app = %self.config.app.name,
            signals = self.ctx.db.len(),
            instances = circuit.instances.len(),
            "elaborated application"
        );

        Artifact::new(
            &self.ctx.db,
            ArtifactParts {
                name: self.config.app.name.clone(),
                circuit,
                clock_domains: self.crg.domains().to_vec(),
                io_signals: self.ctx.constraints.io_signals(),
                sig_constraints: self.ctx.constraints.sig_constraints(),
                platform_commands: self.ctx.constraints.platform_commands().to_vec(),
                symtab,
            },
        )
    }
}
