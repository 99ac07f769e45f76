//! Configuration types deserialized from `weft.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::ops::Range;

/// The top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Application metadata.
    pub app: AppMeta,
    /// Bus widths and address-space layout.
    #[serde(default)]
    pub bus: BusConfig,
    /// Clock definitions keyed by domain name. `sys` is mandatory.
    #[serde(default)]
    pub clocks: BTreeMap<String, ClockDef>,
    /// Platform I/O resources that components may request.
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
    /// Components in instantiation order. The order fixes register and stream
    /// address assignment.
    #[serde(default)]
    pub components: Vec<ComponentDef>,
}

/// Application metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct AppMeta {
    /// Application name, used for output file names.
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: String,
}

/// Bus widths and the two disjoint address regions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// CSR bus data width in bits (8, 16, 32 or 64).
    pub csr_data_width: u32,
    /// First byte address of the CSR region.
    pub csr_base: u64,
    /// Size of the CSR region in bytes.
    pub csr_span: u64,
    /// Payload width of every stream endpoint in bits.
    pub stream_data_width: u32,
    /// First byte address of the stream region.
    pub dma_base: u64,
    /// Size of one stream window in bytes.
    pub dma_port_range: u64,
    /// Maximum number of stream endpoints, both directions combined.
    pub max_streams: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            csr_data_width: 16,
            csr_base: 0x0800_0000,
            csr_span: 0x0800_0000,
            stream_data_width: 16,
            dma_base: 0x1000_0000,
            dma_port_range: 8192,
            max_streams: 8,
        }
    }
}

impl BusConfig {
    /// Byte range reserved for register groups.
    pub fn csr_region(&self) -> Range<u64> {
        self.csr_base..self.csr_base.saturating_add(self.csr_span)
    }

    /// Byte range reserved for stream windows.
    pub fn dma_region(&self) -> Range<u64> {
        let span = self.dma_port_range.saturating_mul(self.max_streams as u64);
        self.dma_base..self.dma_base.saturating_add(span)
    }
}

/// A clock input.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockDef {
    /// Frequency string, e.g. `"100MHz"`.
    pub frequency: String,
    /// Name of the platform resource carrying the clock.
    pub pin: String,
    /// Optional platform resource carrying an external reset.
    #[serde(default)]
    pub reset_pin: Option<String>,
}

/// Electrical constraints shared by resources and subsignals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IoAttrs {
    /// I/O standard, e.g. `"LVCMOS33"`.
    #[serde(default)]
    pub io_standard: Option<String>,
    /// Drive strength in mA.
    #[serde(default)]
    pub drive: Option<u32>,
    /// Verbatim extra constraints.
    #[serde(default)]
    pub misc: Vec<String>,
}

/// A named platform I/O resource.
///
/// Either `pins` or `subsignals` is given, never both.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    /// Resource name, e.g. `"gpmc_ce_n"`.
    pub name: String,
    /// Instance number distinguishing same-named resources.
    #[serde(default)]
    pub number: u32,
    /// Pins of a plain resource, least significant bit first.
    #[serde(default)]
    pub pins: Vec<String>,
    /// Named subsignals of a compound resource.
    #[serde(default)]
    pub subsignals: Vec<SubsignalDef>,
    /// Constraints applied to every pin of the resource.
    #[serde(flatten)]
    pub attrs: IoAttrs,
}

/// One named subsignal of a compound resource.
#[derive(Debug, Clone, Deserialize)]
pub struct SubsignalDef {
    /// Subsignal name, e.g. `"dat_p"`.
    pub name: String,
    /// Pins, least significant bit first.
    pub pins: Vec<String>,
    /// Constraints added to the resource-level ones.
    #[serde(flatten)]
    pub attrs: IoAttrs,
}

/// A component to instantiate.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDef {
    /// Registered component kind, e.g. `"waveform_collector"`.
    pub kind: String,
    /// Optional instance name, used to look the component up afterwards.
    #[serde(default)]
    pub name: Option<String>,
    /// Kind-specific parameters.
    #[serde(default)]
    pub params: toml::Table,
}
