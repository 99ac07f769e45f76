#![allow(dead_code)]

use weft_app::{BaseApp, ComponentRegistry};
use weft_config::{load_config_from_str, AppConfig};

pub const PLATFORM: &str = r#"
[app]
name = "rhino_demo"

[bus]
csr_data_width = 16
stream_data_width = 16
max_streams = 4

[clocks.sys]
frequency = "100MHz"
pin = "clk100"

[[resources]]
name = "clk100"
pins = ["T8"]
io_standard = "LVCMOS33"

[[resources]]
name = "gpmc"
io_standard = "LVCMOS18"

[[resources.subsignals]]
name = "clk"
pins = ["R22"]

[[resources.subsignals]]
name = "ad"
pins = ["A1", "A2", "A3", "A4", "A5", "A6", "A7", "A8", "A9", "A10", "A11", "A12", "A13", "A14", "A15", "A16"]

[[resources.subsignals]]
name = "we_n"
pins = ["B1"]

[[resources.subsignals]]
name = "oe_n"
pins = ["B2"]

[[resources]]
name = "gpmc_ce_n"
number = 0
pins = ["C1"]

[[resources]]
name = "gpmc_ce_n"
number = 1
pins = ["C2"]

[[resources]]
name = "gpmc_dmareq_n"
number = 0
pins = ["D1"]

[[resources]]
name = "gpmc_dmareq_n"
number = 1
pins = ["D2"]

[[resources]]
name = "gpmc_dmareq_n"
number = 2
pins = ["D3"]

[[resources]]
name = "gpmc_dmareq_n"
number = 3
pins = ["D4"]

[[resources]]
name = "adc"
number = 0
io_standard = "LVDS_25"

[[resources.subsignals]]
name = "dat_a"
pins = ["E1", "E2", "E3", "E4", "E5", "E6", "E7", "E8"]

[[resources.subsignals]]
name = "dat_b"
pins = ["F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8"]

[[resources]]
name = "adc"
number = 1
io_standard = "LVDS_25"

[[resources.subsignals]]
name = "dat_a"
pins = ["G1", "G2", "G3", "G4", "G5", "G6", "G7", "G8"]

[[resources.subsignals]]
name = "dat_b"
pins = ["H1", "H2", "H3", "H4", "H5", "H6", "H7", "H8"]

[[resources]]
name = "dac"

[[resources.subsignals]]
name = "dat_i"
pins = ["J1", "J2", "J3", "J4", "J5", "J6", "J7", "J8", "J9", "J10", "J11", "J12", "J13", "J14", "J15", "J16"]

[[resources.subsignals]]
name = "dat_q"
pins = ["K1", "K2", "K3", "K4", "K5", "K6", "K7", "K8", "K9", "K10", "K11", "K12", "K13", "K14", "K15", "K16"]

[[resources.subsignals]]
name = "txenable"
pins = ["L1"]

[[resources.subsignals]]
name = "frame"
pins = ["M1", "M2", "M3", "M4"]
"#;

pub const COLLECTOR_AND_PLAYER: &str = r#"
[[components]]
kind = "waveform_collector"
name = "wc"

[[components]]
kind = "waveform_player"
name = "wp"
"#;

pub fn config(components: &str) -> AppConfig {
    load_config_from_str(&format!("{PLATFORM}{components}")).unwrap()
}

pub fn app(components: &str) -> BaseApp {
    BaseApp::new(config(components), &ComponentRegistry::with_library()).unwrap()
}
