//! Register tables and read plans for Modbus energy meters
//!
//! Every supported meter model describes its registers as data. A producer
//! turns that table into typed read operations, and each operation knows how to
//! decode the raw register bytes into an SI value.

pub mod measurement;
pub mod meters;
pub mod config;
pub mod transport;
pub mod poller;

// Re-export common types for easier access
pub use measurement::Measurement;
pub use meters::{FunctionCode, Opcodes, Operation, Producer, Transform};
pub use meters::registry::{Registry, REGISTRY};
pub use config::Config;
pub use poller::MeterReading;
