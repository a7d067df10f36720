use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Semantic quantity a decoded register value represents.
///
/// Identifiers are shared by all meter models, a model only maps the ones it
/// actually exposes in its opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Measurement {
    VoltageL1,
    VoltageL2,
    VoltageL3,
    Voltage,

    CurrentL1,
    CurrentL2,
    CurrentL3,
    Current,

    PowerL1,
    PowerL2,
    PowerL3,
    Power,

    ReactivePowerL1,
    ReactivePowerL2,
    ReactivePowerL3,
    ReactivePower,

    ApparentPowerL1,
    ApparentPowerL2,
    ApparentPowerL3,
    ApparentPower,

    CosphiL1,
    CosphiL2,
    CosphiL3,
    Cosphi,

    Frequency,

    ImportL1,
    ImportL2,
    ImportL3,
    Import,
    ExportL1,
    ExportL2,
    ExportL3,
    Export,

    ReactiveImportL1,
    ReactiveImportL2,
    ReactiveImportL3,
    ReactiveImport,
    ReactiveExportL1,
    ReactiveExportL2,
    ReactiveExportL3,
    ReactiveExport,
}

/// Coarse grouping used by models to pick a decode and scale per identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementFamily {
    Power,
    Energy,
    Other,
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseMeasurementError {
    #[error("Unknown measurement {0}")]
    Unknown(String),
}

use Measurement::*;

impl Measurement {
    pub const ALL: [Measurement; 41] = [
        VoltageL1, VoltageL2, VoltageL3, Voltage,
        CurrentL1, CurrentL2, CurrentL3, Current,
        PowerL1, PowerL2, PowerL3, Power,
        ReactivePowerL1, ReactivePowerL2, ReactivePowerL3, ReactivePower,
        ApparentPowerL1, ApparentPowerL2, ApparentPowerL3, ApparentPower,
        CosphiL1, CosphiL2, CosphiL3, Cosphi,
        Frequency,
        ImportL1, ImportL2, ImportL3, Import,
        ExportL1, ExportL2, ExportL3, Export,
        ReactiveImportL1, ReactiveImportL2, ReactiveImportL3, ReactiveImport,
        ReactiveExportL1, ReactiveExportL2, ReactiveExportL3, ReactiveExport,
    ];

    pub fn family(&self) -> MeasurementFamily {
        match self {
            PowerL1 | PowerL2 | PowerL3 | Power
            | ReactivePowerL1 | ReactivePowerL2 | ReactivePowerL3 | ReactivePower
            | ApparentPowerL1 | ApparentPowerL2 | ApparentPowerL3 | ApparentPower => MeasurementFamily::Power,

            ImportL1 | ImportL2 | ImportL3 | Import
            | ExportL1 | ExportL2 | ExportL3 | Export
            | ReactiveImportL1 | ReactiveImportL2 | ReactiveImportL3 | ReactiveImport
            | ReactiveExportL1 | ReactiveExportL2 | ReactiveExportL3 | ReactiveExport => MeasurementFamily::Energy,

            _ => MeasurementFamily::Other,
        }
    }

    /// Stable name, also used for serialization and in config files
    pub fn name(&self) -> &'static str {
        match self {
            VoltageL1 => "VoltageL1",
            VoltageL2 => "VoltageL2",
            VoltageL3 => "VoltageL3",
            Voltage => "Voltage",
            CurrentL1 => "CurrentL1",
            CurrentL2 => "CurrentL2",
            CurrentL3 => "CurrentL3",
            Current => "Current",
            PowerL1 => "PowerL1",
            PowerL2 => "PowerL2",
            PowerL3 => "PowerL3",
            Power => "Power",
            ReactivePowerL1 => "ReactivePowerL1",
            ReactivePowerL2 => "ReactivePowerL2",
            ReactivePowerL3 => "ReactivePowerL3",
            ReactivePower => "ReactivePower",
            ApparentPowerL1 => "ApparentPowerL1",
            ApparentPowerL2 => "ApparentPowerL2",
            ApparentPowerL3 => "ApparentPowerL3",
            ApparentPower => "ApparentPower",
            CosphiL1 => "CosphiL1",
            CosphiL2 => "CosphiL2",
            CosphiL3 => "CosphiL3",
            Cosphi => "Cosphi",
            Frequency => "Frequency",
            ImportL1 => "ImportL1",
            ImportL2 => "ImportL2",
            ImportL3 => "ImportL3",
            Import => "Import",
            ExportL1 => "ExportL1",
            ExportL2 => "ExportL2",
            ExportL3 => "ExportL3",
            Export => "Export",
            ReactiveImportL1 => "ReactiveImportL1",
            ReactiveImportL2 => "ReactiveImportL2",
            ReactiveImportL3 => "ReactiveImportL3",
            ReactiveImport => "ReactiveImport",
            ReactiveExportL1 => "ReactiveExportL1",
            ReactiveExportL2 => "ReactiveExportL2",
            ReactiveExportL3 => "ReactiveExportL3",
            ReactiveExport => "ReactiveExport",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VoltageL1 => "Voltage (L1)",
            VoltageL2 => "Voltage (L2)",
            VoltageL3 => "Voltage (L3)",
            Voltage => "Voltage (average)",
            CurrentL1 => "Current (L1)",
            CurrentL2 => "Current (L2)",
            CurrentL3 => "Current (L3)",
            Current => "Current (total)",
            PowerL1 => "Active power (L1)",
            PowerL2 => "Active power (L2)",
            PowerL3 => "Active power (L3)",
            Power => "Active power (total)",
            ReactivePowerL1 => "Reactive power (L1)",
            ReactivePowerL2 => "Reactive power (L2)",
            ReactivePowerL3 => "Reactive power (L3)",
            ReactivePower => "Reactive power (total)",
            ApparentPowerL1 => "Apparent power (L1)",
            ApparentPowerL2 => "Apparent power (L2)",
            ApparentPowerL3 => "Apparent power (L3)",
            ApparentPower => "Apparent power (total)",
            CosphiL1 => "Power factor (L1)",
            CosphiL2 => "Power factor (L2)",
            CosphiL3 => "Power factor (L3)",
            Cosphi => "Power factor (total)",
            Frequency => "Supply frequency",
            ImportL1 => "Active energy + (L1)",
            ImportL2 => "Active energy + (L2)",
            ImportL3 => "Active energy + (L3)",
            Import => "Active energy + (total)",
            ExportL1 => "Active energy - (L1)",
            ExportL2 => "Active energy - (L2)",
            ExportL3 => "Active energy - (L3)",
            Export => "Active energy - (total)",
            ReactiveImportL1 => "Reactive energy + (L1)",
            ReactiveImportL2 => "Reactive energy + (L2)",
            ReactiveImportL3 => "Reactive energy + (L3)",
            ReactiveImport => "Reactive energy + (total)",
            ReactiveExportL1 => "Reactive energy - (L1)",
            ReactiveExportL2 => "Reactive energy - (L2)",
            ReactiveExportL3 => "Reactive energy - (L3)",
            ReactiveExport => "Reactive energy - (total)",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            VoltageL1 | VoltageL2 | VoltageL3 | Voltage => "V",
            CurrentL1 | CurrentL2 | CurrentL3 | Current => "A",
            PowerL1 | PowerL2 | PowerL3 | Power => "W",
            ReactivePowerL1 | ReactivePowerL2 | ReactivePowerL3 | ReactivePower => "var",
            ApparentPowerL1 | ApparentPowerL2 | ApparentPowerL3 | ApparentPower => "VA",
            CosphiL1 | CosphiL2 | CosphiL3 | Cosphi => "",
            Frequency => "Hz",
            ImportL1 | ImportL2 | ImportL3 | Import
            | ExportL1 | ExportL2 | ExportL3 | Export => "kWh",
            ReactiveImportL1 | ReactiveImportL2 | ReactiveImportL3 | ReactiveImport
            | ReactiveExportL1 | ReactiveExportL2 | ReactiveExportL3 | ReactiveExport => "kvarh",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measurement {
    type Err = ParseMeasurementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for m in Measurement::ALL {
            if m.name() == s {
                return Ok(m);
            }
        }
        return Err(ParseMeasurementError::Unknown(s.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_is_unique() {
        let set: HashSet<Measurement> = Measurement::ALL.iter().copied().collect();
        assert_eq!(set.len(), Measurement::ALL.len());
    }

    #[test]
    fn test_name_parses_back() {
        for m in Measurement::ALL {
            assert_eq!(m.name().parse::<Measurement>(), Ok(m));
        }
        assert_eq!(
            "VoltageL4".parse::<Measurement>(),
            Err(ParseMeasurementError::Unknown("VoltageL4".to_string()))
        );
    }

    #[test]
    fn test_family() {
        assert_eq!(PowerL2.family(), MeasurementFamily::Power);
        assert_eq!(ApparentPower.family(), MeasurementFamily::Power);
        assert_eq!(ReactiveExport.family(), MeasurementFamily::Energy);
        assert_eq!(ImportL1.family(), MeasurementFamily::Energy);
        assert_eq!(Frequency.family(), MeasurementFamily::Other);
        assert_eq!(CurrentL3.family(), MeasurementFamily::Other);
    }

    #[test]
    fn test_serde_uses_name() {
        assert_eq!(serde_json::to_string(&ReactivePowerL1).unwrap(), "\"ReactivePowerL1\"");
        let m: Measurement = serde_json::from_str("\"Import\"").unwrap();
        assert_eq!(m, Import);
        assert_eq!(Import.unit(), "kWh");
        assert_eq!(Import.to_string(), "Import");
    }
}
