use meters2mqtt::{config::ConfigError, poller::poll_device, transport::TcpTransport, Config, REGISTRY};
use tokio::task::JoinHandle;
use std::time::Duration;
use log::{error, info, warn};


#[tokio::main]
async fn main() -> Result<(), ConfigError> {
    // Initialize logging
    let default_filter =  std::env::var("E2M_LOG_LEVEL").unwrap_or("info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    info!("Known meter models: {}", REGISTRY.names().join(", "));
    for e in config.unknown_meters(&REGISTRY) {
        error!("{e}");
    }

    let mut threads: Vec<JoinHandle<()>> = Vec::new();

    for device in config.devices.iter() {
        /* An unknown model only takes down this one device */
        let producer = match REGISTRY.lookup(&device.meter) {
            Ok(p) => p,
            Err(e) => {
                warn!("Skipping device {}: {}", device.name, e);
                continue;
            }
        };

        let transport = TcpTransport::new(
            &device.host,
            device.port,
            device.slave_id,
            &device.proto,
            Duration::from_millis(device.timeout_ms),
        );

        let name = device.name.clone();
        let interval = device.read_interval;
        threads.push(tokio::spawn(async move {
            poll_device(producer, transport, name, interval).await;
        }));
    }

    if threads.is_empty() {
        error!("No usable meter devices configured");
        return Ok(());
    }

    info!("All {} devices started, now waiting for a signal to exit", threads.len());
    loop {
        tokio::time::sleep(Duration::from_secs(10)).await;
        if threads.iter().any(|t| t.is_finished()) {
            for task in threads.iter_mut() {
                task.abort();
            }
            break;
        }
    }
    Ok(())
}
