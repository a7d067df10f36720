use crate::measurement::Measurement;
use super::{FunctionCode, Opcodes, Operation, Producer, Transform};

const VOLTAGE_L1: u16 = 0x0000;

/// Eastron SDM630 and its smaller siblings.
/// All values are float32 input registers already reported in W, V, A and kWh.
pub struct SdmProducer {
    opcodes: Opcodes,
}

impl SdmProducer {
    pub fn new() -> Self {
        let opcodes = Opcodes::from([
            (Measurement::VoltageL1, VOLTAGE_L1),
            (Measurement::VoltageL2, 0x0002),
            (Measurement::VoltageL3, 0x0004),
            (Measurement::Voltage, 0x002A),

            (Measurement::CurrentL1, 0x0006),
            (Measurement::CurrentL2, 0x0008),
            (Measurement::CurrentL3, 0x000A),
            (Measurement::Current, 0x0030),

            (Measurement::PowerL1, 0x000C),
            (Measurement::PowerL2, 0x000E),
            (Measurement::PowerL3, 0x0010),
            (Measurement::Power, 0x0034),

            (Measurement::ApparentPowerL1, 0x0012),
            (Measurement::ApparentPowerL2, 0x0014),
            (Measurement::ApparentPowerL3, 0x0016),
            (Measurement::ApparentPower, 0x0038),

            (Measurement::ReactivePowerL1, 0x0018),
            (Measurement::ReactivePowerL2, 0x001A),
            (Measurement::ReactivePowerL3, 0x001C),
            (Measurement::ReactivePower, 0x003C),

            (Measurement::CosphiL1, 0x001E),
            (Measurement::CosphiL2, 0x0020),
            (Measurement::CosphiL3, 0x0022),
            (Measurement::Cosphi, 0x003E),

            (Measurement::Frequency, 0x0046),

            (Measurement::Import, 0x0048),
            (Measurement::Export, 0x004A),
            (Measurement::ReactiveImport, 0x004C),
            (Measurement::ReactiveExport, 0x004E),

            (Measurement::ImportL1, 0x015A),
            (Measurement::ImportL2, 0x015C),
            (Measurement::ImportL3, 0x015E),
            (Measurement::ExportL1, 0x0160),
            (Measurement::ExportL2, 0x0162),
            (Measurement::ExportL3, 0x0164),
        ]);

        return SdmProducer { opcodes };
    }

    pub fn opcodes(&self) -> &Opcodes {
        &self.opcodes
    }
}

impl Default for SdmProducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Producer for SdmProducer {
    fn description(&self) -> &str {
        "Eastron SDM630"
    }

    fn probe(&self) -> Operation {
        Operation::new(FunctionCode::ReadInputRegisters, VOLTAGE_L1, Measurement::VoltageL1, Transform::Float32)
    }

    fn produce(&self) -> Vec<Operation> {
        self.opcodes
            .iter()
            .map(|(m, address)| Operation::new(FunctionCode::ReadInputRegisters, address, m, Transform::Float32))
            .collect()
    }
}
