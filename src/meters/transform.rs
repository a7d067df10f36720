use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("Expected {expected} bytes of register data but got {actual}")]
    PayloadLength { expected: usize, actual: usize },
}

/// Decode step from raw register bytes to a measurement value.
///
/// All variants read big-endian register words as they come off the bus.
/// `Scaled` multiplies the result of its inner transform, nesting multiplies
/// the factors.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Float32,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Uint64,
    Int64,
    Scaled { inner: Box<Transform>, factor: f64 },
}

impl Transform {
    /// Number of 16 bit registers this transform consumes
    pub fn word_length(&self) -> u16 {
        match self {
            Transform::Uint16 | Transform::Int16 => 1,
            Transform::Float32 | Transform::Uint32 | Transform::Int32 => 2,
            Transform::Uint64 | Transform::Int64 => 4,
            Transform::Scaled { inner, .. } => inner.word_length(),
        }
    }

    pub fn scaled(self, factor: f64) -> Transform {
        return Transform::Scaled { inner: Box::new(self), factor };
    }

    pub fn apply(&self, bytes: &[u8]) -> Result<f64, DecodeError> {
        let expected = self.word_length() as usize * 2;
        if bytes.len() != expected {
            return Err(DecodeError::PayloadLength { expected, actual: bytes.len() });
        }

        let value = match self {
            Transform::Float32 => float_from_registers(&be4(bytes)),
            Transform::Uint16 => u16::from_be_bytes([bytes[0], bytes[1]]) as f64,
            Transform::Int16 => i16::from_be_bytes([bytes[0], bytes[1]]) as f64,
            Transform::Uint32 => u32::from_be_bytes(be4(bytes)) as f64,
            Transform::Int32 => i32::from_be_bytes(be4(bytes)) as f64,
            Transform::Uint64 => u64::from_be_bytes(be8(bytes)) as f64,
            Transform::Int64 => int_from_registers(&be8(bytes)),
            Transform::Scaled { inner, factor } => inner.apply(bytes)? * factor,
        };
        return Ok(value);
    }
}

fn be4(bytes: &[u8]) -> [u8; 4] {
    let mut b = [0u8; 4];
    b.copy_from_slice(&bytes[..4]);
    b
}

fn be8(bytes: &[u8]) -> [u8; 8] {
    let mut b = [0u8; 8];
    b.copy_from_slice(&bytes[..8]);
    b
}

/// IEEE-754 single precision float spread over two registers
pub fn float_from_registers(bytes: &[u8; 4]) -> f64 {
    f32::from_be_bytes(*bytes) as f64
}

/// Signed 64 bit counter spread over four registers
pub fn int_from_registers(bytes: &[u8; 8]) -> f64 {
    i64::from_be_bytes(*bytes) as f64
}
