use uuid::Uuid;

// DJI Ronin BLE command endpoint
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000fff000001000800000805f9b34fb);
pub const CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x0000fff500001000800000805f9b34fb);

// Advertised name prefix the gimbals use
pub const DEVICE_NAME_PREFIX: &str = "DJI";

// Packet framing. Byte 1 of the prefix (0x16 = 22) is the frame length.
pub const PACKET_PREFIX: [u8; 6] = [0x55, 0x16, 0x04, 0xfc, 0x02, 0x04];
pub const PACKET_MIDFIX: [u8; 3] = [0x40, 0x04, 0x01];
pub const PACKET_SUFFIX: [u8; 3] = [0x00, 0x00, 0x02];
pub const PACKET_LEN: usize = 22;

// Axis command constants
pub const AXIS_OFFSET: u16 = 1024;
pub const AXIS_SCALE: f64 = 256.0;
pub const MIN_AXIS: f64 = -1.0;
pub const MAX_AXIS: f64 = 1.0;

// Websocket defaults
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
