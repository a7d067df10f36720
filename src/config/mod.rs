use std::fs::File;
use std::io::prelude::*;
use std::path::Path;
use log::info;
use serde::{Deserialize, Serialize};
use serde_yml;
use thiserror::Error;

use crate::meters::registry::Registry;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse config: {0}")]
    Parse(#[from] serde_yml::Error),
    #[error("Unable to read the config on config/meters.yaml or meters.yaml")]
    NotFound,
    #[error("Device {device} uses unknown meter model {meter}")]
    UnknownMeter { device: String, meter: String },
}

#[derive(Deserialize, Serialize, Clone, PartialEq, Debug)]
pub enum ModbusProtoConfig {
    TCP,
    RTUoverTCP,
}

fn device_port_default() -> u16 { return 502 }
fn device_proto_default() -> ModbusProtoConfig { return ModbusProtoConfig::TCP }
fn device_slave_id_default() -> u8 { return 1 }
fn device_read_interval_default() -> u32 { return 60 }
fn device_timeout_ms_default() -> u64 { return 1000 }

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct DeviceConfig {
    pub name: String,
    /* Model name as known by the registry, e.g. IEM3000 */
    pub meter: String,
    pub host: String,
    #[serde(default="device_port_default")]
    pub port: u16,
    #[serde(default="device_proto_default")]
    pub proto: ModbusProtoConfig,
    #[serde(default="device_slave_id_default")]
    pub slave_id: u8,
    #[serde(default="device_read_interval_default")]
    pub read_interval: u32,
    #[serde(default="device_timeout_ms_default")]
    pub timeout_ms: u64,
}

fn devices_default() -> Vec<DeviceConfig> { return Vec::new() }

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    #[serde(default="devices_default")]
    pub devices: Vec<DeviceConfig>,
}

impl Config {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let c: Config = serde_yml::from_str(contents)?;
        return Ok(c);
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| ConfigError::Read { path: path.display().to_string(), source: e })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ConfigError::Read { path: path.display().to_string(), source: e })?;

        let c = Config::from_yaml(&contents)?;
        info!("Loaded {} meter devices from {}", c.devices.len(), path.display());
        return Ok(c);
    }

    /// Looks for config/meters.yaml first and falls back to meters.yaml
    pub fn load_default() -> Result<Self, ConfigError> {
        for candidate in ["config/meters.yaml", "meters.yaml"] {
            if Path::new(candidate).exists() {
                return Config::load(candidate);
            }
        }
        return Err(ConfigError::NotFound);
    }

    /// Every device whose meter model the registry can not build
    pub fn unknown_meters(&self, registry: &Registry) -> Vec<ConfigError> {
        self.devices
            .iter()
            .filter(|d| !registry.contains(&d.meter))
            .map(|d| ConfigError::UnknownMeter { device: d.name.clone(), meter: d.meter.clone() })
            .collect()
    }
}
