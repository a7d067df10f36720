use std::future::Future;
use thiserror::Error;
use crate::meters::FunctionCode;

#[cfg(feature = "modbus")]
pub mod tcp;

#[cfg(feature = "modbus")]
pub use tcp::TcpTransport;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid Modbus response: {0}")]
    Frame(String),
    #[error("Connection closed while reading the response")]
    Closed,
    #[error("Expected {expected} registers but got {actual}")]
    Length { expected: u16, actual: usize },
    #[error("No response within {0} ms")]
    Timeout(u64),
}

/// Executes a single register read on the bus.
///
/// On success exactly `words * 2` bytes are returned, the registers in bus
/// order with each word big-endian.
pub trait Transport {
    fn read(&mut self, function_code: FunctionCode, address: u16, words: u16)
        -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Flattens decoded register words back into the big-endian byte payload
/// operations decode from.
pub fn registers_to_bytes(words: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 2);
    for w in words {
        bytes.extend_from_slice(&w.to_be_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_to_bytes() {
        // 230.0f32 is 0x4366_0000
        let bytes = registers_to_bytes(&[0x4366, 0x0000]);
        assert_eq!(bytes, vec![0x43, 0x66, 0x00, 0x00]);
        assert_eq!(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 230.0);
        assert!(registers_to_bytes(&[]).is_empty());
    }
}
