use crate::constants::{
    AXIS_OFFSET, AXIS_SCALE, PACKET_LEN, PACKET_MIDFIX, PACKET_PREFIX, PACKET_SUFFIX,
};
use crate::types::ControlInput;
use std::fmt;

// The Ronin checksum is not the stock CRC-16/CCITT-FALSE: same polynomial,
// but reflected in/out with init 0x496c. Verified against captured packets.
const CRC_ALGORITHM: crc::Algorithm<u16> = crc::Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0x496c,
    refin: true,
    refout: true,
    xorout: 0x0000,
    check: 0x7109,
    residue: 0x0000,
};
const CRC: crc::Crc<u16> = crc::Crc::<u16>::new(&CRC_ALGORITHM);

pub fn checksum(bytes: &[u8]) -> u16 {
    CRC.checksum(bytes)
}

/// Maps a clamped axis value in [-1, 1] to the device command range.
/// Squaring the magnitude (sign preserved) flattens the response near the
/// stick center for fine framing; truncation toward zero matches the device's
/// reference encoder.
pub fn scale(axis: f64) -> i16 {
    (axis * axis.abs() * AXIS_SCALE) as i16
}

/// A complete 22-byte command frame, immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet([u8; PACKET_LEN]);

impl Packet {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

fn encode_axis(value: i16) -> [u8; 2] {
    // scale() keeps |value| <= 1024, so the biased result fits in 11 bits
    debug_assert!(value.unsigned_abs() <= AXIS_OFFSET);
    AXIS_OFFSET.wrapping_add_signed(value).to_le_bytes()
}

/// Assembles the wire frame. Axis fields go out tilt, roll, pan; that order
/// is what the gimbal expects, not a quirk of this code.
pub fn build_packet(seq: u16, pan: i16, tilt: i16, roll: i16) -> Packet {
    let mut buf = [0u8; PACKET_LEN];
    buf[0..6].copy_from_slice(&PACKET_PREFIX);
    buf[6..8].copy_from_slice(&seq.to_le_bytes());
    buf[8..11].copy_from_slice(&PACKET_MIDFIX);
    buf[11..13].copy_from_slice(&encode_axis(tilt));
    buf[13..15].copy_from_slice(&encode_axis(roll));
    buf[15..17].copy_from_slice(&encode_axis(pan));
    buf[17..20].copy_from_slice(&PACKET_SUFFIX);
    let crc = checksum(&buf[..20]);
    buf[20..22].copy_from_slice(&crc.to_le_bytes());
    Packet(buf)
}

/// Per-session packet builder. Owns the sequence counter; one instance per
/// connected gimbal, advanced once per frame, wrapping at 65535.
#[derive(Debug)]
pub struct PacketCodec {
    seq: u16,
}

impl PacketCodec {
    pub fn new() -> Self {
        PacketCodec { seq: 0 }
    }

    pub fn seq(&self) -> u16 {
        self.seq
    }

    /// Counters restart only when a session is (re)established.
    pub fn reset(&mut self) {
        self.seq = 0;
    }

    /// Clamps, scales, and frames one control sample, then advances the
    /// sequence counter.
    pub fn encode(&mut self, input: &ControlInput) -> Packet {
        let input = input.clamped();
        let packet = build_packet(
            self.seq,
            scale(input.pan),
            scale(input.tilt),
            scale(input.roll),
        );
        self.seq = self.seq.wrapping_add(1);
        packet
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unhex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn crc_check_value() {
        assert_eq!(checksum(b"123456789"), 0x7109);
    }

    #[test]
    fn scale_preserves_sign_and_bounds() {
        for a in [-1.0, -0.9, -0.3, 0.0, 0.2, 0.6, 1.0] {
            let s = scale(a);
            assert!(s.unsigned_abs() <= 1024);
            if a > 0.0 {
                assert!(s >= 0);
            } else if a < 0.0 {
                assert!(s <= 0);
            } else {
                assert_eq!(s, 0);
            }
        }
    }

    #[test]
    fn scale_endpoints() {
        assert_eq!(scale(0.0), 0);
        assert_eq!(scale(1.0), 256);
        assert_eq!(scale(-1.0), -256);
        assert_eq!(scale(0.5), 64);
        assert_eq!(scale(-0.5), -64);
    }

    #[test]
    fn scale_truncates_toward_zero() {
        // 0.77^2 * 256 = 151.78; rounding would give 152
        assert_eq!(scale(0.77), 151);
        assert_eq!(scale(-0.77), -151);
    }

    #[test]
    fn neutral_packet_golden_vector() {
        let packet = build_packet(0, 0, 0, 0);
        assert_eq!(
            packet.as_bytes(),
            unhex("551604fc02040000400401000400040004000002ba57").as_slice()
        );
    }

    #[test]
    fn mixed_axes_golden_vector() {
        let packet = build_packet(1, 100, -200, 300);
        assert_eq!(
            packet.as_bytes(),
            unhex("551604fc0204010040040138032c056404000002a898").as_slice()
        );
    }

    #[test]
    fn max_sequence_golden_vector() {
        let packet = build_packet(65535, 256, -256, 0);
        assert_eq!(
            packet.as_bytes(),
            unhex("551604fc0204ffff4004010003000400050000029a81").as_slice()
        );
    }

    #[test]
    fn checksum_round_trip() {
        let packet = build_packet(42, 17, -350, 901);
        let bytes = packet.as_bytes();
        assert_eq!(bytes.len(), PACKET_LEN);
        let crc = checksum(&bytes[..20]);
        assert_eq!(&bytes[20..22], crc.to_le_bytes());
    }

    #[test]
    fn axis_fields_are_tilt_roll_pan() {
        // distinct values so a swapped field order cannot pass
        let packet = build_packet(0, 3, 1, 2);
        let bytes = packet.as_bytes();
        assert_eq!(&bytes[11..13], (1024u16 + 1).to_le_bytes()); // tilt
        assert_eq!(&bytes[13..15], (1024u16 + 2).to_le_bytes()); // roll
        assert_eq!(&bytes[15..17], (1024u16 + 3).to_le_bytes()); // pan
    }

    #[test]
    fn codec_sequence_advances_and_wraps() {
        let mut codec = PacketCodec::new();
        let input = ControlInput::new(0.0, 0.0, 0.0);
        for n in 0u16..5 {
            let packet = codec.encode(&input);
            let bytes = packet.as_bytes();
            assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), n);
        }
        codec.seq = 65535;
        let packet = codec.encode(&input);
        assert_eq!(&packet.as_bytes()[6..8], [0xff, 0xff]);
        assert_eq!(codec.seq(), 0);
    }

    #[test]
    fn codec_clamps_before_scaling() {
        let mut codec = PacketCodec::new();
        let wild = codec.encode(&ControlInput::new(5.0, -9.0, 2.0));
        codec.reset();
        let clamped = codec.encode(&ControlInput::new(1.0, -1.0, 1.0));
        assert_eq!(wild, clamped);
    }

    #[test]
    fn reset_restarts_counter() {
        let mut codec = PacketCodec::new();
        codec.encode(&ControlInput::new(0.1, 0.1, 0.1));
        codec.encode(&ControlInput::new(0.1, 0.1, 0.1));
        assert_eq!(codec.seq(), 2);
        codec.reset();
        assert_eq!(codec.seq(), 0);
    }
}
