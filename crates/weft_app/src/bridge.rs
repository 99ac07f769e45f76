//! The host bus bridge black box.

use crate::context::BuildContext;
use crate::error::AppError;
use tracing::debug;
use weft_bank::{CsrBus, StreamDirection, StreamEndpoint};
use weft_ir::{Circuit, Instance, SignalId, SYS_DOMAIN};
use weft_platform::PinBundle;

/// Module name of the bridge instance handed to the code generator.
pub const BRIDGE_MODULE: &str = "gpmc_bridge";

/// Connects the host's external memory bus to the CSR bus and to every stream.
///
/// The bridge claims the `gpmc` bus resource, chip selects `gpmc_ce_n` 0 (CSR
/// window) and 1 (DMA window), and one `gpmc_dmareq_n` line per stream.
#[derive(Debug)]
pub struct BusBridge {
    csr: CsrBus,
    instance: Instance,
}

impl BusBridge {
    /// Requests the bridge pins and builds the instance.
    ///
    /// Streams are bound in symbol table order: host-to-fabric first.
    pub fn new(ctx: &mut BuildContext) -> Result<Self, AppError> {
        let bus = ctx.bus().clone();
        let from: Vec<StreamEndpoint> = ctx.streams.ports(StreamDirection::FromExternal).cloned().collect();
        let to: Vec<StreamEndpoint> = ctx.streams.ports(StreamDirection::ToExternal).cloned().collect();

        let gpmc = ctx.constraints.request(&mut ctx.db, "gpmc", None)?;
        let csr_ce = plain(ctx, "gpmc_ce_n", 0)?;
        let dma_ce = plain(ctx, "gpmc_ce_n", 1)?;
        let dmareq = (0..from.len() + to.len())
            .map(|i| plain(ctx, "gpmc_dmareq_n", i as u32))
            .collect::<Result<Vec<_>, _>>()?;

        let dma_port_range = i64::try_from(bus.dma_port_range).map_err(|_| AppError::ParamOverflow {
            instance: BRIDGE_MODULE.to_string(),
            param: "DMA_PORT_RANGE".to_string(),
            value: bus.dma_port_range,
        })?;
        let address_width = address_width(bus.csr_span / ctx.csrs.bytes_per_word());
        let csr = CsrBus::new(&mut ctx.db, address_width, bus.csr_data_width);

        let mut inst = Instance::new(BRIDGE_MODULE)
            .named("bridge")
            .param_int("CSR_DATA_WIDTH", i64::from(bus.csr_data_width))
            .param_int("CSR_ADDRESS_WIDTH", i64::from(address_width))
            .param_int("STREAM_DATA_WIDTH", i64::from(bus.stream_data_width))
            .param_int("DMA_PORT_RANGE", dma_port_range)
            .param_int("STREAMS_FROM", from.len() as i64)
            .param_int("STREAMS_TO", to.len() as i64)
            .clock("sys_clk", SYS_DOMAIN)
            .reset("sys_rst", SYS_DOMAIN);

        inst = match gpmc {
            PinBundle::Single(id) => inst.inout("gpmc", id),
            PinBundle::Compound(subs) => subs
                .into_iter()
                .fold(inst, |inst, (name, id)| inst.inout(format!("gpmc_{name}"), id)),
        };
        inst = inst.input("csr_ce_n", csr_ce).input("dma_ce_n", dma_ce);
        for (i, req) in dmareq.into_iter().enumerate() {
            inst = inst.output(format!("dmareq{i}_n"), req);
        }

        inst = inst
            .output("csr_adr", csr.adr)
            .output("csr_we", csr.we)
            .output("csr_dat_w", csr.dat_w)
            .input("csr_dat_r", csr.dat_r);

        for (i, s) in from.iter().enumerate() {
            let ep = &s.endpoint;
            inst = inst.output(format!("from{i}_stb"), ep.stb()).input(format!("from{i}_ack"), ep.ack());
            for (field, id) in ep.token().iter() {
                inst = inst.output(format!("from{i}_{field}"), id);
            }
        }
        for (i, s) in to.iter().enumerate() {
            let ep = &s.endpoint;
            inst = inst.input(format!("to{i}_stb"), ep.stb()).output(format!("to{i}_ack"), ep.ack());
            for (field, id) in ep.token().iter() {
                inst = inst.input(format!("to{i}_{field}"), id);
            }
        }

        debug!(
            address_width,
            streams_from = from.len(),
            streams_to = to.len(),
            "built bus bridge"
        );
        Ok(Self { csr, instance: inst })
    }

    /// The CSR master interface.
    pub fn csr(&self) -> CsrBus {
        self.csr
    }

    /// The bridge instance.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// The bridge as a circuit fragment.
    pub fn fragment(self) -> Circuit {
        let mut c = Circuit::new();
        c.instance(self.instance);
        for id in self.csr.signals() {
            c.declare(id);
        }
        c
    }
}

/// Address bits needed to select one of `words` words.
pub fn address_width(words: u64) -> u32 {
    (u64::BITS - words.saturating_sub(1).leading_zeros()).max(1)
}

fn plain(ctx: &mut BuildContext, resource: &str, number: u32) -> Result<SignalId, AppError> {
    match ctx.constraints.request(&mut ctx.db, resource, Some(number))? {
        PinBundle::Single(id) => Ok(id),
        PinBundle::Compound(_) => Err(AppError::ResourceShape {
            resource: format!("{resource}:{number}"),
            role: "bus bridge pin".to_string(),
            reason: "expected plain pins, found subsignals".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_widths() {
        assert_eq!(address_width(0), 1);
        assert_eq!(address_width(1), 1);
        assert_eq!(address_width(2), 1);
        assert_eq!(address_width(3), 2);
        assert_eq!(address_width(0x0400_0000), 26);
    }
}
