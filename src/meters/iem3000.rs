use crate::measurement::{Measurement, MeasurementFamily};
use super::{FunctionCode, Opcodes, Operation, Producer, Transform};

const VOLTAGE_L1: u16 = 0x0863;

/// Schneider Electric iEM3000 series.
///
/// Register map from the iEM3100/iEM3200/iEM3300 user guide (DOCA0005), page 49.
/// Powers are float32, energies are int64 counters, everything lives in
/// holding registers.
pub struct Iem3000Producer {
    opcodes: Opcodes,
}

impl Iem3000Producer {
    pub fn new() -> Self {
        let opcodes = Opcodes::from([
            (Measurement::VoltageL1, VOLTAGE_L1),
            (Measurement::VoltageL2, 0x0865),
            (Measurement::VoltageL3, 0x0867),
            (Measurement::Voltage, 0x0869),

            (Measurement::CurrentL1, 0x085B),
            (Measurement::CurrentL2, 0x085D),
            (Measurement::CurrentL3, 0x085F),
            (Measurement::Current, 0x0861),

            (Measurement::PowerL1, 0x086B),
            (Measurement::PowerL2, 0x086D),
            (Measurement::PowerL3, 0x086F),
            (Measurement::Power, 0x0871),

            (Measurement::ReactivePower, 0x0879),
            (Measurement::ApparentPower, 0x0881),

            (Measurement::Frequency, 0x07E6),

            (Measurement::Import, 0x0BC4),
            (Measurement::ImportL1, 0x0BB8),
            (Measurement::ImportL2, 0x0BBC),
            (Measurement::ImportL3, 0x0BC0),
            (Measurement::Export, 0x0BD4),

            (Measurement::ReactiveImport, 0x0BE4),
            (Measurement::ReactiveExport, 0x0BF4),
        ]);

        return Iem3000Producer { opcodes };
    }

    pub fn opcodes(&self) -> &Opcodes {
        &self.opcodes
    }

    fn snip(&self, measurement: Measurement, address: u16, transform: Transform) -> Operation {
        Operation::new(FunctionCode::ReadHoldingRegisters, address, measurement, transform)
    }
}

impl Default for Iem3000Producer {
    fn default() -> Self {
        Self::new()
    }
}

impl Producer for Iem3000Producer {
    fn description(&self) -> &str {
        "Schneider Electric iEM3000 series"
    }

    fn probe(&self) -> Operation {
        self.snip(Measurement::VoltageL1, VOLTAGE_L1, Transform::Float32)
    }

    fn produce(&self) -> Vec<Operation> {
        let mut res = Vec::with_capacity(self.opcodes.len());
        for (measurement, address) in self.opcodes.iter() {
            let transform = match measurement.family() {
                MeasurementFamily::Power => Transform::Float32.scaled(0.001),
                MeasurementFamily::Energy => Transform::Int64.scaled(1000.0),
                MeasurementFamily::Other => Transform::Float32,
            };
            res.push(self.snip(measurement, address, transform));
        }
        res
    }
}
