mod codec;
mod constants;
mod controller;
mod server;
mod transport;
mod types;

pub use codec::{build_packet, checksum, scale, Packet, PacketCodec};
pub use controller::{ControlError, Fleet, Gimbal};
pub use server::{serve, ControlMessage, MessageError};
pub use transport::{default_adapter, discover_gimbals, Transport, TransportError};
pub use types::{Axis, ControlInput};

// Re-export commonly used items
pub use constants::{CHARACTERISTIC_UUID, DEFAULT_LISTEN_ADDR, PACKET_LEN, SERVICE_UUID};
