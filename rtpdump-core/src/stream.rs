use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use indexmap::IndexMap;
use log::{debug, info};

use crate::rtp::RtpPacket;

/// Last sequence number above this value may wrap around
pub const SEQ_WRAP_HIGH: u16 = 65435;
/// New sequence number below this value may follow a wrap around
pub const SEQ_WRAP_LOW: u16 = 100;

/// Whether going from `last` to `seq` looks like a 16 bits sequence number wrap-around,
/// tolerating about 100 lost packets on each side of the boundary.
pub fn is_seq_wrap(last: u16, seq: u16) -> bool {
    last > SEQ_WRAP_HIGH && seq < SEQ_WRAP_LOW
}

/// Whether `seq` continues a flow whose newest accepted packet is `last`.
pub fn is_newer_seq(last: u16, seq: u16) -> bool {
    seq > last || is_seq_wrap(last, seq)
}

/// One RTP flow and its packets in arrival order.
///
/// Invariant: `total_expected_packets == packets.len() + lost_packets`.
#[derive(Clone, Debug, Default)]
pub struct RtpStream {
    pub ssrc: u32,
    pub payload_type: u8,
    pub src: Option<SocketAddr>,
    pub dst: Option<SocketAddr>,
    /// Reception time of the first packet since UNIX EPOCH
    pub start_time: Duration,
    /// Reception time of the last accepted packet since UNIX EPOCH
    pub end_time: Duration,
    pub first_timestamp: u32,
    pub first_seq: u16,
    /// Number of sequence number wrap-arounds
    pub cycles: u32,
    /// Highest accepted sequence number
    pub cur_seq: u16,
    pub total_expected_packets: u64,
    pub lost_packets: u64,
    packets: Vec<RtpPacket>,
}

impl RtpStream {
    pub fn new(ssrc: u32, payload_type: u8) -> Self {
        Self {
            ssrc,
            payload_type,
            ..Default::default()
        }
    }

    pub fn with_addrs(mut self, src: Option<SocketAddr>, dst: Option<SocketAddr>) -> Self {
        self.src = src;
        self.dst = dst;
        self
    }

    /// Accept `pkt` into the flow, or drop it if it is out of sequence.
    /// Returns whether the packet has been accepted.
    pub fn add_packet(&mut self, pkt: RtpPacket) -> bool {
        let mut lost = 0;

        if self.packets.is_empty() {
            self.start_time = pkt.received_at;
            self.first_seq = pkt.seq();
            self.first_timestamp = pkt.ts();
        } else {
            let delta = pkt.seq() as i32 - self.cur_seq as i32 - 1;
            if delta < 0 {
                if !is_seq_wrap(self.cur_seq, pkt.seq()) {
                    debug!(
                        "ssrc {:#010x}: drop out of sequence packet {} after {}",
                        self.ssrc,
                        pkt.seq(),
                        self.cur_seq
                    );
                    return false;
                }

                // packets lost before and after the wrap-around
                lost = (0xffff - self.cur_seq) as u64 + pkt.seq() as u64;
                self.cycles += 1;
                info!(
                    "ssrc {:#010x}: sequence number wrap-around detected, lost {} packets",
                    self.ssrc, lost
                );
            } else {
                lost = delta as u64;
            }

            if lost != 0 {
                debug!(
                    "ssrc {:#010x}: {} packets lost between packets {} and {}",
                    self.ssrc,
                    lost,
                    self.cur_seq,
                    pkt.seq()
                );
            }
        }

        self.end_time = pkt.received_at;
        self.cur_seq = pkt.seq();
        self.total_expected_packets += 1 + lost;
        self.lost_packets += lost;
        self.packets.push(pkt);
        true
    }

    pub fn packets(&self) -> &[RtpPacket] {
        &self.packets
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

fn time_of_day(t: Duration) -> String {
    let secs = t.as_secs() % 86400;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        t.subsec_millis()
    )
}

fn addr_or_unknown(addr: Option<SocketAddr>) -> String {
    addr.map(|a| a.to_string()).unwrap_or_else(|| "?".into())
}

impl fmt::Display for RtpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}   {:#010X}   {:3}   {:5}   {} -> {}",
            time_of_day(self.start_time),
            time_of_day(self.end_time),
            self.ssrc,
            self.payload_type,
            self.packets.len(),
            addr_or_unknown(self.src),
            addr_or_unknown(self.dst),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct StreamKey {
    ssrc: u32,
    payload_type: u8,
}

/// Group packets into flows by ssrc and payload type, keeping flows in order of first appearance.
#[derive(Debug, Default)]
pub struct StreamDemuxer {
    streams: IndexMap<StreamKey, RtpStream>,
    src: Option<SocketAddr>,
    dst: Option<SocketAddr>,
}

impl StreamDemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses recorded on every flow created afterwards
    pub fn with_addrs(mut self, src: Option<SocketAddr>, dst: Option<SocketAddr>) -> Self {
        self.src = src;
        self.dst = dst;
        self
    }

    /// Returns whether the packet has been accepted by its flow.
    pub fn add_packet(&mut self, pkt: RtpPacket) -> bool {
        let key = StreamKey {
            ssrc: pkt.ssrc,
            payload_type: pkt.payload_type,
        };
        let (src, dst) = (self.src, self.dst);
        self.streams
            .entry(key)
            .or_insert_with(|| {
                debug!("new stream ssrc {:#010x}, pt {}", key.ssrc, key.payload_type);
                RtpStream::new(key.ssrc, key.payload_type).with_addrs(src, dst)
            })
            .add_packet(pkt)
    }

    pub fn streams(&self) -> impl Iterator<Item = &RtpStream> {
        self.streams.values()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn into_streams(self) -> Vec<RtpStream> {
        self.streams.into_values().collect()
    }
}
