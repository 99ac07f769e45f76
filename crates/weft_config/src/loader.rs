//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{AppConfig, BusConfig};
use std::collections::HashSet;
use std::path::Path;
use weft_common::Frequency;

/// File name looked up inside an application directory.
pub const CONFIG_FILE_NAME: &str = "weft.toml";

/// Loads `<app_dir>/weft.toml`.
pub fn load_config(app_dir: &Path) -> Result<AppConfig, ConfigError> {
    load_config_file(&app_dir.join(CONFIG_FILE_NAME))
}

/// Loads a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration held in memory.
pub fn load_config_from_str(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.app.name.trim().is_empty() {
        return Err(ConfigError::MissingField("app.name".to_string()));
    }
    validate_bus(&config.bus)?;

    let mut seen = HashSet::new();
    for r in &config.resources {
        if !seen.insert((r.name.as_str(), r.number)) {
            return Err(ConfigError::DuplicateResource {
                name: r.name.clone(),
                number: r.number,
            });
        }
        match (r.pins.is_empty(), r.subsignals.is_empty()) {
            (true, true) => {
                return Err(ConfigError::ValidationError(format!(
                    "resource '{}' has neither pins nor subsignals",
                    r.name
                )))
            }
            (false, false) => {
                return Err(ConfigError::ValidationError(format!(
                    "resource '{}' has both pins and subsignals",
                    r.name
                )))
            }
            _ => {}
        }
        if let Some(sub) = r.subsignals.iter().find(|s| s.pins.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "subsignal '{}.{}' has no pins",
                r.name, sub.name
            )));
        }
    }

    if !config.clocks.contains_key("sys") {
        return Err(ConfigError::MissingField("clocks.sys".to_string()));
    }
    for (domain, clock) in &config.clocks {
        clock.frequency.parse::<Frequency>().map_err(|e| {
            ConfigError::ValidationError(format!("clock '{domain}': {e}"))
        })?;
        for pin in std::iter::once(&clock.pin).chain(clock.reset_pin.as_ref()) {
            if !config.resources.iter().any(|r| &r.name == pin) {
                return Err(ConfigError::UnknownClockPin {
                    domain: domain.clone(),
                    resource: pin.clone(),
                });
            }
        }
    }

    for (i, c) in config.components.iter().enumerate() {
        if c.kind.trim().is_empty() {
            return Err(ConfigError::MissingField(format!("components[{i}].kind")));
        }
    }
    Ok(())
}

fn validate_bus(bus: &BusConfig) -> Result<(), ConfigError> {
    if !matches!(bus.csr_data_width, 8 | 16 | 32 | 64) {
        return Err(ConfigError::ValidationError(format!(
            "bus.csr_data_width must be 8, 16, 32 or 64, got {}",
            bus.csr_data_width
        )));
    }
    if bus.stream_data_width == 0 || bus.stream_data_width > 64 {
        return Err(ConfigError::ValidationError(format!(
            "bus.stream_data_width must be between 1 and 64, got {}",
            bus.stream_data_width
        )));
    }
    if bus.dma_port_range == 0 {
        return Err(ConfigError::ValidationError(
            "bus.dma_port_range must be non-zero".to_string(),
        ));
    }
    if bus.csr_span == 0 {
        return Err(ConfigError::ValidationError(
            "bus.csr_span must be non-zero".to_string(),
        ));
    }
    let csr = bus.csr_region();
    let dma = bus.dma_region();
    if csr.start < dma.end && dma.start < csr.end {
        return Err(ConfigError::RegionOverlap { csr, dma });
    }
    Ok(())
}
