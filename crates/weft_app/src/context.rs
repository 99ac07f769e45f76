//! Shared state handed to component factories.

use weft_bank::{CsrManager, StreamManager};
use weft_config::{AppConfig, BusConfig};
use weft_ir::{ClockDomain, SignalDb};
use weft_platform::ConstraintManager;

/// Everything a component factory may allocate from.
///
/// Owned by the [`BaseApp`](crate::BaseApp) and lent to one factory at a time.
#[derive(Debug)]
pub struct BuildContext {
    /// The session's signal database.
    pub db: SignalDb,
    /// Platform pin allocation.
    pub constraints: ConstraintManager,
    /// Register group allocation.
    pub csrs: CsrManager,
    /// Stream endpoint allocation.
    pub streams: StreamManager,
    bus: BusConfig,
    domains: Vec<ClockDomain>,
}

impl BuildContext {
    /// Creates empty managers sized from the configuration.
    pub fn new(config: &AppConfig) -> Self {
        let bus = config.bus.clone();
        Self {
            db: SignalDb::new(),
            constraints: ConstraintManager::new(config.resources.clone()),
            csrs: CsrManager::new(bus.csr_data_width),
            streams: StreamManager::new(bus.stream_data_width, bus.max_streams),
            bus,
            domains: Vec::new(),
        }
    }

    /// Bus widths and address regions.
    pub fn bus(&self) -> &BusConfig {
        &self.bus
    }

    /// Clock domains generated so far.
    pub fn domains(&self) -> &[ClockDomain] {
        &self.domains
    }

    /// Looks up a clock domain by name.
    pub fn domain(&self, name: &str) -> Option<&ClockDomain> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub(crate) fn set_domains(&mut self, domains: Vec<ClockDomain>) {
        self.domains = domains;
    }
}
