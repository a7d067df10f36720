use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::measurement::Measurement;

pub mod transform;
pub mod registry;
pub mod iem3000;
pub mod sdm;

pub use transform::{DecodeError, Transform};

/// Modbus function codes a read plan may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionCode {
    ReadHoldingRegisters = 0x03,
    ReadInputRegisters = 0x04,
}

impl FunctionCode {
    pub fn code(&self) -> u8 {
        return *self as u8;
    }
}

/// One bus read and how to turn its answer into a value.
///
/// The word length is always taken from the transform, so an operation can
/// never ask the bus for a different amount of data than it will decode.
/// Fields are read only, the constructor is the only way to build one.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    function_code: FunctionCode,
    register_address: u16,
    word_length: u16,
    measurement: Measurement,
    transform: Transform,
}

impl Operation {
    pub fn new(function_code: FunctionCode, register_address: u16, measurement: Measurement, transform: Transform) -> Self {
        Operation {
            function_code,
            register_address,
            word_length: transform.word_length(),
            measurement,
            transform,
        }
    }

    pub fn function_code(&self) -> FunctionCode {
        self.function_code
    }

    pub fn register_address(&self) -> u16 {
        self.register_address
    }

    pub fn word_length(&self) -> u16 {
        self.word_length
    }

    pub fn measurement(&self) -> Measurement {
        self.measurement
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<f64, DecodeError> {
        self.transform.apply(bytes)
    }
}

/// Register addresses of one meter model, keyed by what they measure.
/// Zero is a valid address, a missing key means the model lacks the quantity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Opcodes {
    table: HashMap<Measurement, u16>,
}

impl Opcodes {
    pub fn get(&self, measurement: Measurement) -> Option<u16> {
        self.table.get(&measurement).copied()
    }

    pub fn contains(&self, measurement: Measurement) -> bool {
        self.table.contains_key(&measurement)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Measurement, u16)> + '_ {
        self.table.iter().map(|(m, a)| (*m, *a))
    }
}

impl FromIterator<(Measurement, u16)> for Opcodes {
    fn from_iter<I: IntoIterator<Item = (Measurement, u16)>>(iter: I) -> Self {
        Opcodes { table: iter.into_iter().collect() }
    }
}

impl<const N: usize> From<[(Measurement, u16); N]> for Opcodes {
    fn from(entries: [(Measurement, u16); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Read plan source for one meter model.
pub trait Producer: Send + Sync {
    /// Human readable model name
    fn description(&self) -> &str;

    /// A single cheap read every device of this model answers, used to check
    /// the device is there before running the full plan.
    fn probe(&self) -> Operation;

    /// One operation per quantity the model exposes. The order carries no meaning.
    fn produce(&self) -> Vec<Operation>;
}
