use crate::codec::PacketCodec;
use crate::transport::{Transport, TransportError};
use crate::types::{Axis, ControlInput};
use btleplug::platform::Peripheral;
use std::error::Error;
use std::fmt;
use strum::IntoEnumIterator;

/// Why a control message could not be turned into a gimbal command.
#[derive(Debug)]
pub enum ControlError {
    NonFiniteAxis(Axis),
    UnknownCamera { index: usize, count: usize },
    Transport(TransportError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::NonFiniteAxis(axis) => {
                write!(f, "Axis '{}' is not a finite number", axis.name())
            }
            ControlError::UnknownCamera { index, count } => {
                write!(f, "Camera index {} out of range (have {})", index, count)
            }
            ControlError::Transport(e) => write!(f, "{}", e),
        }
    }
}

impl Error for ControlError {}

impl From<TransportError> for ControlError {
    fn from(e: TransportError) -> Self {
        ControlError::Transport(e)
    }
}

pub(crate) fn validate_input(input: &ControlInput) -> Result<(), ControlError> {
    match Axis::iter().find(|axis| !input.axis(*axis).is_finite()) {
        Some(axis) => Err(ControlError::NonFiniteAxis(axis)),
        None => Ok(()),
    }
}

/// One control session with one gimbal: the BLE link plus the sequence
/// counter that belongs to it.
pub struct Gimbal {
    transport: Transport,
    codec: PacketCodec,
}

impl fmt::Display for Gimbal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ronin[{}]", self.transport.name())
    }
}

impl Gimbal {
    pub fn new(name: String, peripheral: Peripheral) -> Self {
        Gimbal {
            transport: Transport::new(name, peripheral),
            codec: PacketCodec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.transport.name()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub async fn connect(&mut self) -> Result<(), TransportError> {
        println!("{}: Connecting", self);
        self.transport.connect().await?;
        // a fresh session starts its sequence numbers over
        self.codec.reset();
        println!("{}: Connected", self);
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), TransportError> {
        if !self.transport.is_connected() {
            println!("{}: Already disconnected", self);
            return Ok(());
        }
        println!("{}: Disconnecting", self);
        self.transport.disconnect().await?;
        println!("{}: Disconnected", self);
        Ok(())
    }

    pub async fn reconnect(&mut self) -> Result<(), TransportError> {
        self.disconnect().await?;
        self.connect().await
    }

    /// Clamps, encodes, and writes one control sample. All-zero samples are
    /// not transmitted; the gimbal holds position without rest frames.
    pub async fn send_command(&mut self, input: &ControlInput) -> Result<(), TransportError> {
        let input = input.clamped();
        if input.is_rest() {
            return Ok(());
        }
        self.transport.ensure_connected().await?;
        let packet = self.codec.encode(&input);
        println!("{}: Sending {}", self, packet);
        self.transport.write(packet.as_bytes()).await
    }
}

/// All gimbals found at startup, addressed by the camera index the UI sends.
/// Lookups are bounds-checked; the index comes from untrusted JSON.
pub struct Fleet {
    gimbals: Vec<Gimbal>,
}

impl Fleet {
    pub fn new(gimbals: Vec<Gimbal>) -> Self {
        Fleet { gimbals }
    }

    pub fn len(&self) -> usize {
        self.gimbals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gimbals.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Gimbal, ControlError> {
        let count = self.gimbals.len();
        self.gimbals
            .get_mut(index)
            .ok_or(ControlError::UnknownCamera { index, count })
    }

    /// Validates and routes one control message to the addressed gimbal.
    pub async fn dispatch(
        &mut self,
        camera: usize,
        input: &ControlInput,
    ) -> Result<(), ControlError> {
        validate_input(input)?;
        let gimbal = self.get_mut(camera)?;
        gimbal.send_command(input).await?;
        Ok(())
    }

    pub async fn connect_all(&mut self) -> Result<(), TransportError> {
        for gimbal in &mut self.gimbals {
            gimbal.connect().await?;
        }
        Ok(())
    }

    /// Best-effort teardown used on every exit path; a failure on one device
    /// must not leave the others connected.
    pub async fn disconnect_all(&mut self) {
        for gimbal in &mut self.gimbals {
            if let Err(e) = gimbal.disconnect().await {
                eprintln!("{}: Disconnect failed: {}", gimbal.name(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fleet_rejects_any_camera_index() {
        let mut fleet = Fleet::new(Vec::new());
        match fleet.get_mut(0) {
            Err(ControlError::UnknownCamera { index: 0, count: 0 }) => {}
            other => panic!("expected UnknownCamera, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn non_finite_axes_are_rejected_by_name() {
        let ok = ControlInput::new(0.2, -0.4, 0.0);
        assert!(validate_input(&ok).is_ok());

        let bad = ControlInput::new(0.0, f64::NAN, 0.0);
        match validate_input(&bad) {
            Err(ControlError::NonFiniteAxis(Axis::Tilt)) => {}
            other => panic!("expected NonFiniteAxis(Tilt), got {:?}", other),
        }

        let bad = ControlInput::new(f64::INFINITY, 0.0, 0.0);
        assert!(matches!(
            validate_input(&bad),
            Err(ControlError::NonFiniteAxis(Axis::Pan))
        ));
    }

    #[test]
    fn control_error_messages_name_the_problem() {
        let e = ControlError::UnknownCamera { index: 4, count: 2 };
        assert_eq!(e.to_string(), "Camera index 4 out of range (have 2)");
        let e = ControlError::NonFiniteAxis(Axis::Roll);
        assert!(e.to_string().contains("roll"));
    }
}
