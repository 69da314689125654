use std::fmt;
use std::time::Duration;

use byteorder::{BigEndian, ByteOrder};

use crate::errors::{Error, Result};

const RTP_VERSION: u8 = 2;
const RTP_FIXED_HEADER_LEN: usize = 12;

/// One decoded RTP packet, see RFC 3550 section 5.1
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RtpPacket {
    pub ssrc: u32,
    pub payload_type: u8,
    pub marker: bool,
    pub sequence_number: u16,
    /// Timestamp in codec clock units
    pub timestamp: u32,
    pub payload: Vec<u8>,
    /// Reception time since UNIX EPOCH
    pub received_at: Duration,
}

impl RtpPacket {
    /// Parse RTP fixed header, CSRC list, header extension and padding.
    pub fn parse(data: &[u8], received_at: Duration) -> Result<Self> {
        if data.len() < RTP_FIXED_HEADER_LEN {
            return Err(Error::InvalidPacket("shorter than rtp fixed header"));
        }

        let version = data[0] >> 6;
        if version != RTP_VERSION {
            return Err(Error::InvalidPacket("not rtp version 2"));
        }
        let padding = (data[0] & 0x20) == 0x20;
        let extension = (data[0] & 0x10) == 0x10;
        let csrc_count = (data[0] & 0x0f) as usize;

        let mut offset = RTP_FIXED_HEADER_LEN + csrc_count * 4;
        if extension {
            if data.len() < offset + 4 {
                return Err(Error::InvalidPacket("truncated header extension"));
            }
            let ext_words = BigEndian::read_u16(&data[offset + 2..offset + 4]) as usize;
            offset += 4 + ext_words * 4;
        }
        if data.len() < offset {
            return Err(Error::InvalidPacket("truncated rtp header"));
        }

        let mut end = data.len();
        if padding {
            let pad = data[end - 1] as usize;
            if pad == 0 || end - offset < pad {
                return Err(Error::InvalidPacket("invalid padding length"));
            }
            end -= pad;
        }

        Ok(Self {
            ssrc: BigEndian::read_u32(&data[8..12]),
            payload_type: data[1] & 0x7f,
            marker: (data[1] & 0x80) == 0x80,
            sequence_number: BigEndian::read_u16(&data[2..4]),
            timestamp: BigEndian::read_u32(&data[4..8]),
            payload: data[offset..end].to_vec(),
            received_at,
        })
    }

    pub fn seq(&self) -> u16 {
        self.sequence_number
    }

    pub fn ts(&self) -> u32 {
        self.timestamp
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Telephony event carried in a 4 bytes payload, see RFC 4733 section 2.3
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RtpEvent {
    pub event: u8,
    pub end_of_event: bool,
    pub volume: u8,
    pub duration: u16,
}

impl fmt::Display for RtpEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event: {:#x}, end of event: {}, volume: {}, duration: {}",
            self.event, self.end_of_event, self.volume, self.duration
        )
    }
}

pub fn parse_rtp_event(payload: &[u8]) -> Option<RtpEvent> {
    if payload.len() != 4 {
        return None;
    }
    Some(RtpEvent {
        event: payload[0],
        end_of_event: (payload[1] & 0x80) != 0,
        volume: payload[1] & 0x3f,
        duration: BigEndian::read_u16(&payload[2..4]),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn header(seq: u16, ts: u32, ssrc: u32) -> Vec<u8> {
        let mut raw = vec![0x80, 0x60];
        raw.extend_from_slice(&seq.to_be_bytes());
        raw.extend_from_slice(&ts.to_be_bytes());
        raw.extend_from_slice(&ssrc.to_be_bytes());
        raw
    }

    #[test]
    fn test_parse_fixed_header() {
        let mut raw = header(0x1234, 160, 0xdeadbeef);
        raw.extend_from_slice(&[0xf0, 0x04, 0xaa]);
        let pkt = RtpPacket::parse(&raw, Duration::from_millis(20)).unwrap();
        assert_eq!(pkt.seq(), 0x1234);
        assert_eq!(pkt.ts(), 160);
        assert_eq!(pkt.ssrc, 0xdeadbeef);
        assert_eq!(pkt.payload_type, 96);
        assert!(!pkt.marker);
        assert_eq!(pkt.payload(), &[0xf0, 0x04, 0xaa]);
        assert_eq!(pkt.received_at, Duration::from_millis(20));
    }

    #[test]
    fn test_parse_csrc_extension_padding() {
        let mut raw = header(1, 2, 3);
        // 1 csrc, extension, padding
        raw[0] = 0x80 | 0x20 | 0x10 | 0x01;
        raw[1] = 0x80 | 97;
        raw.extend_from_slice(&[0, 0, 0, 9]);
        raw.extend_from_slice(&[0xbe, 0xde, 0x00, 0x01, 1, 2, 3, 4]);
        raw.extend_from_slice(&[0x11, 0x22]);
        raw.extend_from_slice(&[0, 0, 3]);
        let pkt = RtpPacket::parse(&raw, Duration::ZERO).unwrap();
        assert!(pkt.marker);
        assert_eq!(pkt.payload_type, 97);
        assert_eq!(pkt.payload(), &[0x11, 0x22]);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            RtpPacket::parse(&[0x80, 0x00], Duration::ZERO),
            Err(Error::InvalidPacket(_))
        ));
        let mut raw = header(1, 2, 3);
        raw[0] = 0x40;
        assert!(RtpPacket::parse(&raw, Duration::ZERO).is_err());
    }

    #[test]
    fn test_parse_rtp_event() {
        let evt = parse_rtp_event(&[0x05, 0x8a, 0x03, 0x20]).unwrap();
        assert_eq!(evt.event, 5);
        assert!(evt.end_of_event);
        assert_eq!(evt.volume, 10);
        assert_eq!(evt.duration, 800);
        assert!(parse_rtp_event(&[0x05, 0x8a, 0x03]).is_none());
    }
}
