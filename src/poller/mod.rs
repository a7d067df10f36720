use std::collections::BTreeMap;
use std::time::Duration;
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::measurement::Measurement;
use crate::meters::{DecodeError, Producer};
use crate::transport::{Transport, TransportError};

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Probe of {meter} failed: {source}")]
    ProbeFailed {
        meter: String,
        #[source]
        source: TransportError,
    },
    #[error("Probe of {meter} returned unusable data: {source}")]
    ProbeDecode {
        meter: String,
        #[source]
        source: DecodeError,
    },
}

/// Decoded values of one complete read cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReading {
    pub meter_name: String,
    pub model: String,
    pub metered_time: i64,
    pub values: BTreeMap<Measurement, f64>,
}

/// Probes the device and, if it answers, runs the whole read plan.
///
/// A failing probe fails the cycle. Failures of single operations are logged
/// and the quantity is left out of the reading.
pub async fn read_cycle<T: Transport>(producer: &dyn Producer, transport: &mut T, meter_name: &str) -> Result<MeterReading, CycleError> {
    let probe = producer.probe();
    let bytes = transport.read(probe.function_code(), probe.register_address(), probe.word_length()).await
        .map_err(|e| CycleError::ProbeFailed { meter: meter_name.to_string(), source: e })?;
    let probe_value = probe.decode(&bytes)
        .map_err(|e| CycleError::ProbeDecode { meter: meter_name.to_string(), source: e })?;
    debug!("Meter {} probe {} = {}", meter_name, probe.measurement(), probe_value);

    let mut reading = MeterReading {
        meter_name: meter_name.to_string(),
        model: producer.description().to_string(),
        metered_time: Utc::now().timestamp(),
        values: BTreeMap::new(),
    };

    for op in producer.produce() {
        let bytes = match transport.read(op.function_code(), op.register_address(), op.word_length()).await {
            Ok(b) => b,
            Err(e) => {
                warn!("Meter {} register {:#06x} ({}) not read: {}", meter_name, op.register_address(), op.measurement(), e);
                continue;
            }
        };

        match op.decode(&bytes) {
            Ok(v) => { reading.values.insert(op.measurement(), v); }
            Err(e) => error!("Meter {} {} could not be decoded: {}", meter_name, op.measurement(), e),
        }
    }

    return Ok(reading);
}

/// Reads the device every `read_interval` seconds forever
pub async fn poll_device<T: Transport>(producer: Box<dyn Producer>, mut transport: T, meter_name: String, read_interval: u32) {
    let delay = Duration::from_secs(std::cmp::max(read_interval, 1) as u64);
    info!("Polling {} ({}) every {} seconds", meter_name, producer.description(), delay.as_secs());

    loop {
        debug!("Device {} start reading", meter_name);
        match read_cycle(producer.as_ref(), &mut transport, &meter_name).await {
            Ok(reading) => match serde_json::to_string(&reading) {
                Ok(json) => info!("{json}"),
                Err(e) => error!("Unable to serialize reading of {}: {:?}", meter_name, e),
            },
            Err(e) => error!("{e}"),
        }
        debug!("Device {} done reading", meter_name);

        tokio::time::sleep(delay).await;
    }
}
