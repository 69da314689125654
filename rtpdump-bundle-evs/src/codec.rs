use log::{debug, info, warn};

use rtpdump_core::codec::{Codec, CodecMetadata, CodecOptions};
use rtpdump_core::errors::{invalid_state, Error, Result};
use rtpdump_core::rtp::{parse_rtp_event, RtpPacket};
use rtpdump_core::stream::is_newer_seq;

use crate::consts::{EVS_MIME_CHANNELS, EVS_MIME_MAGIC};
use crate::rtp::{compact_to_storage, header_full_to_storage};
use crate::{EVS_METADATA, OPT_HEADER_FORMAT};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderFormat {
    Compact,
    HeaderFull,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum State {
    #[default]
    Unconfigured,
    Configured(HeaderFormat),
    Streaming(HeaderFormat),
}

/// EVS RTP payload to MIME storage format (3GPP TS 26.445 A.2.6) transcoder
#[derive(Clone, Debug, Default)]
pub struct Evs {
    state: State,
    last_seq: Option<u16>,
}

pub fn new_evs() -> Box<dyn Codec> {
    Box::<Evs>::default()
}

impl Evs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_format(&self) -> Option<HeaderFormat> {
        match self.state {
            State::Unconfigured => None,
            State::Configured(hf) | State::Streaming(hf) => Some(hf),
        }
    }
}

impl Codec for Evs {
    fn metadata(&self) -> &'static CodecMetadata {
        &EVS_METADATA
    }

    fn configure(&mut self, options: &CodecOptions) -> Result<()> {
        if matches!(self.state, State::Streaming(_)) {
            return invalid_state("codec already started");
        }
        EVS_METADATA.validate(options)?;

        let hf = match options.get(OPT_HEADER_FORMAT).map(String::as_str) {
            Some("1") => HeaderFormat::HeaderFull,
            _ => HeaderFormat::Compact,
        };
        self.state = State::Configured(hf);
        Ok(())
    }

    fn reset(&mut self) {
        if let State::Streaming(hf) = self.state {
            self.state = State::Configured(hf);
        }
        self.last_seq = None;
    }

    fn format_magic(&self) -> Result<Vec<u8>> {
        let mut magic = EVS_MIME_MAGIC.to_vec();
        magic.extend_from_slice(EVS_MIME_CHANNELS);
        Ok(magic)
    }

    fn handle_packet(&mut self, pkt: &RtpPacket) -> Result<Vec<u8>> {
        let hf = match self.state {
            State::Unconfigured => return invalid_state("codec not configured"),
            State::Configured(hf) | State::Streaming(hf) => hf,
        };
        self.state = State::Streaming(hf);

        debug!("decoding packet with sequence number {}", pkt.seq());
        if let Some(last) = self.last_seq {
            if !is_newer_seq(last, pkt.seq()) {
                return Err(Error::OutOfSequence {
                    last,
                    seq: pkt.seq(),
                });
            }
        }
        self.last_seq = Some(pkt.seq());

        if let Some(evt) = parse_rtp_event(pkt.payload()) {
            info!("possible RTP event: {}", evt);
            return Ok(vec![]);
        }

        match hf {
            HeaderFormat::HeaderFull => {
                Ok(header_full_to_storage(pkt.payload())?.unwrap_or_default())
            }
            HeaderFormat::Compact => match compact_to_storage(pkt.payload()) {
                Some(frame) => Ok(frame),
                None => {
                    warn!(
                        "packet {}: {} bytes is not a compact payload size",
                        pkt.seq(),
                        pkt.payload().len()
                    );
                    Ok(vec![])
                }
            },
        }
    }
}
