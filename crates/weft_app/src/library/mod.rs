//! Bundled components.

mod adc;
mod collector;
mod dac;
mod player;

pub use adc::AdcCapture;
pub use collector::{waveform_collector, Collector};
pub use dac::{Dac, DacRate};
pub use player::waveform_player;

use crate::error::AppError;
use weft_ir::SignalId;
use weft_platform::PinBundle;

/// Registry kind of the waveform collector.
pub const WAVEFORM_COLLECTOR: &str = "waveform_collector";

/// Registry kind of the waveform player.
pub const WAVEFORM_PLAYER: &str = "waveform_player";

/// Default register group UID of the waveform player.
pub const UID_WAVEFORM_PLAYER: u32 = 1;

/// Default register group UID of the waveform collector.
pub const UID_WAVEFORM_COLLECTOR: u32 = 2;

fn subsignal(bundle: &PinBundle, resource: &str, role: &str, name: &str) -> Result<SignalId, AppError> {
    bundle.subsignal(name).ok_or_else(|| AppError::ResourceShape {
        resource: resource.to_string(),
        role: role.to_string(),
        reason: format!("missing subsignal '{name}'"),
    })
}
