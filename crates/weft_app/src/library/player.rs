use super::{Dac, DacRate, UID_WAVEFORM_PLAYER, WAVEFORM_PLAYER};
use crate::component::{Component, ComponentSpec, FlowComponent};
use crate::context::BuildContext;
use crate::error::AppError;
use tracing::debug;
use weft_bank::{StreamDirection, STREAM_FIELD};
use weft_flow::{CompositeActor, DataflowGraph, Route, Unpack};

/// Two host streams joined into the sample fields of a DAC.
///
/// Parameters: `dac` (resource name, default `"dac"`), `uid` and
/// `double_dac`. The register group is named after the component; the
/// streams are `<name>_i` and `<name>_q`. At double rate each stream word
/// is split in two halves, the low half played first.
pub fn waveform_player(ctx: &mut BuildContext, spec: &ComponentSpec) -> Result<Box<dyn Component>, AppError> {
    let label = spec.label();
    let uid = spec.param_u32("uid", UID_WAVEFORM_PLAYER)?;
    let resource = spec.param_str("dac", "dac")?;
    let rate = if spec.param_bool("double_dac", false)? {
        DacRate::Double
    } else {
        DacRate::Single
    };

    let pins = ctx.constraints.request(&mut ctx.db, &resource, None)?;
    let dac = Dac::new(&mut ctx.db, &pins, &resource, rate)?;
    ctx.csrs.request(&mut ctx.db, label.clone(), uid, dac.registers())?;
    let width = ctx.streams.data_width();

    let mut g = DataflowGraph::new();
    let mut streams = Vec::new();
    for channel in ["i", "q"] {
        let stream = ctx
            .streams
            .request(&mut ctx.db, format!("{label}_{channel}"), StreamDirection::FromExternal)?;
        streams.push((channel, g.add_actor(stream)));
    }
    let dac = g.add_actor(dac);
    for (channel, stream) in streams {
        let route = Route::new().sink_fields(rate.channel_fields(channel));
        match rate {
            DacRate::Single => g.connect(stream, dac, route)?,
            DacRate::Double => {
                let split = g.add_actor(Unpack::new(&mut ctx.db, STREAM_FIELD, width, rate.samples())?);
                g.connect(stream, split, Route::new())?;
                g.connect(split, dac, route)?
            }
        };
    }
    debug!(component = %label, uid, ?rate, "wired waveform player");

    let top = CompositeActor::new(&mut ctx.db, WAVEFORM_PLAYER, g);
    Ok(Box::new(FlowComponent::new(label, WAVEFORM_PLAYER, top)))
}
