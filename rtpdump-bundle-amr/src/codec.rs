use log::{debug, info, warn};

use rtpdump_core::codec::{Codec, CodecMetadata, CodecOptions};
use rtpdump_core::errors::{invalid_state, Error, Result};
use rtpdump_core::rtp::{parse_rtp_event, RtpPacket};
use rtpdump_core::stream::is_newer_seq;

use crate::consts::{Alignment, Band};
use crate::rtp::{bandwidth_efficient_to_storage, detect_parameters, octet_aligned_to_storage};
use crate::{AMR_METADATA, OPT_OCTET_ALIGNED, OPT_SAMPLE_RATE};

/// Larger gaps are taken as a timestamp discontinuity rather than lost frames, 60 seconds
const MAX_LOST_FRAMES: u32 = 3000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum State {
    #[default]
    Unconfigured,
    /// Options recorded, no packet seen yet
    Configured,
    /// Packets seen, payload parameters still unknown
    Detecting,
    Streaming {
        alignment: Alignment,
        band: Band,
    },
}

/// AMR / AMR-WB RTP payload to storage format (RFC 4867 section 5) transcoder
#[derive(Clone, Debug, Default)]
pub struct Amr {
    state: State,
    /// Alignment set by options, detected when `None`
    alignment: Option<Alignment>,
    /// Band set by options, detected when `None`
    band: Option<Band>,
    last_ts: Option<u32>,
    last_seq: Option<u16>,
}

pub fn new_amr() -> Box<dyn Codec> {
    Box::<Amr>::default()
}

impl Amr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current band, configured or detected
    pub fn band(&self) -> Option<Band> {
        match self.state {
            State::Streaming { band, .. } => Some(band),
            _ => self.band,
        }
    }

    /// Current payload layout, configured or detected
    pub fn alignment(&self) -> Option<Alignment> {
        match self.state {
            State::Streaming { alignment, .. } => Some(alignment),
            _ => self.alignment,
        }
    }

    fn parameters(&mut self, payload: &[u8]) -> Result<(Alignment, Band)> {
        if let State::Streaming { alignment, band } = self.state {
            return Ok((alignment, band));
        }

        let (alignment, band) = match (self.alignment, self.band) {
            (Some(alignment), Some(band)) => (alignment, band),
            (alignment, band) => {
                self.state = State::Detecting;
                detect_parameters(payload, alignment, band)?
            }
        };
        self.state = State::Streaming { alignment, band };
        Ok((alignment, band))
    }

    /// Frames lost between the previous packet and one with timestamp `ts`
    fn lost_frames(&self, ts: u32, band: Band) -> u32 {
        let Some(last_ts) = self.last_ts else {
            return 0;
        };

        match ts.wrapping_sub(last_ts) / band.samples_per_frame() {
            0 => {
                debug!("timestamp {} does not advance from {}", ts, last_ts);
                0
            }
            frames if frames - 1 > MAX_LOST_FRAMES => {
                warn!(
                    "timestamp jumps from {} to {}, no filler frames inserted",
                    last_ts, ts
                );
                0
            }
            frames => frames - 1,
        }
    }
}

impl Codec for Amr {
    fn metadata(&self) -> &'static CodecMetadata {
        &AMR_METADATA
    }

    fn configure(&mut self, options: &CodecOptions) -> Result<()> {
        if matches!(self.state, State::Detecting | State::Streaming { .. }) {
            return invalid_state("codec already started");
        }
        AMR_METADATA.validate(options)?;

        self.alignment = match options.get(OPT_OCTET_ALIGNED).map(String::as_str) {
            Some("0") => Some(Alignment::BandwidthEfficient),
            Some("1") => Some(Alignment::OctetAligned),
            _ => None,
        };
        self.band = match options.get(OPT_SAMPLE_RATE).map(String::as_str) {
            Some("nb") => Some(Band::Narrow),
            Some("wb") => Some(Band::Wide),
            _ => None,
        };
        self.state = State::Configured;
        Ok(())
    }

    fn reset(&mut self) {
        if self.state != State::Unconfigured {
            self.state = State::Configured;
        }
        self.last_ts = None;
        self.last_seq = None;
    }

    fn format_magic(&self) -> Result<Vec<u8>> {
        match self.band() {
            Some(band) => Ok(band.magic().to_vec()),
            None => invalid_state("sample rate unknown"),
        }
    }

    fn handle_packet(&mut self, pkt: &RtpPacket) -> Result<Vec<u8>> {
        if self.state == State::Unconfigured {
            return invalid_state("codec not configured");
        }

        debug!("decoding packet with sequence number {}", pkt.seq());
        if let Some(last) = self.last_seq {
            if !is_newer_seq(last, pkt.seq()) {
                return Err(Error::OutOfSequence {
                    last,
                    seq: pkt.seq(),
                });
            }
        }

        if let Some(evt) = parse_rtp_event(pkt.payload()) {
            info!("possible RTP event: {}", evt);
            self.last_seq = Some(pkt.seq());
            return Ok(vec![]);
        }

        let (alignment, band) = self.parameters(pkt.payload())?;
        let lost = self.lost_frames(pkt.ts(), band);

        let frame = match alignment {
            Alignment::OctetAligned => octet_aligned_to_storage(pkt.payload(), band)?,
            Alignment::BandwidthEfficient => bandwidth_efficient_to_storage(pkt.payload(), band)?,
        };

        if lost > 0 {
            debug!(
                "{} frames lost before packet {}, {}ms",
                lost,
                pkt.seq(),
                lost * 20
            );
        }
        let mut result = vec![band.no_data_frame(); lost as usize];
        result.extend_from_slice(&frame);

        self.last_ts = Some(pkt.ts());
        self.last_seq = Some(pkt.seq());
        Ok(result)
    }
}
