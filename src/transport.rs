use crate::constants::{CHARACTERISTIC_UUID, DEVICE_NAME_PREFIX, SERVICE_UUID};
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::error::Error;
use std::fmt;
use std::time::Instant;
use tokio::time::{timeout, Duration};

const RECONNECT_TIMEOUT: Duration = Duration::from_millis(200);
const SCAN_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub enum TransportError {
    NoAdapter,
    NoDeviceFound,
    CharacteristicNotFound,
    NotConnected,
    ReconnectTimeout { name: String },
    Ble(btleplug::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NoAdapter => write!(f, "No Bluetooth adapter found"),
            TransportError::NoDeviceFound => {
                write!(f, "No {} gimbals found", DEVICE_NAME_PREFIX)
            }
            TransportError::CharacteristicNotFound => {
                write!(f, "Command characteristic {} not found", CHARACTERISTIC_UUID)
            }
            TransportError::NotConnected => write!(f, "Device is not connected"),
            TransportError::ReconnectTimeout { name } => {
                write!(f, "{}: timed out while trying to reconnect", name)
            }
            TransportError::Ble(e) => write!(f, "Bluetooth error: {}", e),
        }
    }
}

impl Error for TransportError {}

impl From<btleplug::Error> for TransportError {
    fn from(e: btleplug::Error) -> Self {
        TransportError::Ble(e)
    }
}

pub async fn default_adapter() -> Result<Adapter, TransportError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(TransportError::NoAdapter)
}

/// Scans for peripherals advertising a name with the DJI prefix and returns
/// them with their advertised names. The scan runs for the full duration so
/// slow advertisers are not missed.
pub async fn discover_gimbals(
    adapter: &Adapter,
    scan_duration: Duration,
) -> Result<Vec<(String, Peripheral)>, TransportError> {
    adapter.start_scan(ScanFilter::default()).await?;
    println!("Scanning for {} gimbals...", DEVICE_NAME_PREFIX);

    let deadline = Instant::now() + scan_duration;
    let mut found: Vec<(String, Peripheral)> = Vec::new();
    while Instant::now() < deadline {
        tokio::time::sleep(SCAN_POLL_INTERVAL).await;
        for peripheral in adapter.peripherals().await? {
            let name = match peripheral.properties().await?.and_then(|p| p.local_name) {
                Some(n) if n.starts_with(DEVICE_NAME_PREFIX) => n,
                _ => continue,
            };
            if !found.iter().any(|(_, p)| p.id() == peripheral.id()) {
                println!("Found {} [{}]", name, peripheral.id());
                found.push((name, peripheral));
            }
        }
    }
    adapter.stop_scan().await?;

    if found.is_empty() {
        Err(TransportError::NoDeviceFound)
    } else {
        Ok(found)
    }
}

/// BLE link to one gimbal. Holds the peripheral for the whole program run;
/// the characteristic handle only exists while connected.
pub struct Transport {
    name: String,
    peripheral: Peripheral,
    characteristic: Option<Characteristic>,
}

impl Transport {
    pub fn new(name: String, peripheral: Peripheral) -> Self {
        Transport {
            name,
            peripheral,
            characteristic: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.characteristic.is_some()
    }

    pub async fn connect(&mut self) -> Result<(), TransportError> {
        self.peripheral.connect().await?;
        self.characteristic = Some(find_command_characteristic(&self.peripheral).await?);
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.characteristic = None;
        self.peripheral.disconnect().await?;
        Ok(())
    }

    /// The gimbal drops the link after idle periods. Checks liveness and, if
    /// the link is down, re-establishes it within a bounded time so a stale
    /// connection stalls a single command rather than the whole session.
    pub async fn ensure_connected(&mut self) -> Result<(), TransportError> {
        if self.characteristic.is_none() {
            return Err(TransportError::NotConnected);
        }
        if self.peripheral.is_connected().await? {
            return Ok(());
        }

        println!("{}: Lost connection, reconnecting...", self.name);
        let timer = Instant::now();
        self.peripheral.disconnect().await?;
        timeout(RECONNECT_TIMEOUT, self.peripheral.connect())
            .await
            .map_err(|_| TransportError::ReconnectTimeout {
                name: self.name.clone(),
            })??;
        self.characteristic = Some(find_command_characteristic(&self.peripheral).await?);
        println!("{}: Reconnected in {:?}", self.name, timer.elapsed());
        Ok(())
    }

    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let characteristic = self
            .characteristic
            .as_ref()
            .ok_or(TransportError::NotConnected)?;
        self.peripheral
            .write(characteristic, bytes, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }
}

async fn find_command_characteristic(
    peripheral: &Peripheral,
) -> Result<Characteristic, TransportError> {
    peripheral.discover_services().await?;
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == CHARACTERISTIC_UUID && c.service_uuid == SERVICE_UUID)
        .ok_or(TransportError::CharacteristicNotFound)
}
