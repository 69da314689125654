use std::io::Write;

use log::{debug, warn};

use crate::codec::Codec;
use crate::errors::Result;
use crate::stream::RtpStream;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DumpStats {
    /// Packets transcoded into at least one frame
    pub packets: usize,
    /// Packets skipped as out of sequence or too short
    pub skipped: usize,
    /// Packets accepted without output, telephony events and dropped layouts
    pub empty: usize,
    /// Bytes written, format magic included
    pub bytes: usize,
}

/// Transcode every packet of `stream` with `codec` into `out`.
///
/// The format magic is written as soon as the codec knows it. Skippable packet errors are
/// counted and ignored, any other error stops the dump and is returned; in that case the
/// output is incomplete and should be discarded. The codec is reset before returning.
pub fn dump_stream<W: Write + ?Sized>(
    codec: &mut dyn Codec,
    stream: &RtpStream,
    out: &mut W,
) -> Result<DumpStats> {
    let result = dump_packets(codec, stream, out);
    codec.reset();
    result
}

fn dump_packets<W: Write + ?Sized>(
    codec: &mut dyn Codec,
    stream: &RtpStream,
    out: &mut W,
) -> Result<DumpStats> {
    let mut stats = DumpStats::default();

    let mut got_magic = false;
    if let Ok(magic) = codec.format_magic() {
        out.write_all(&magic)?;
        stats.bytes += magic.len();
        got_magic = true;
    }

    for pkt in stream.packets() {
        let frames = match codec.handle_packet(pkt) {
            Ok(frames) => frames,
            Err(err) if err.is_skip() => {
                debug!("skip packet {}: {}", pkt.seq(), err);
                stats.skipped += 1;
                continue;
            }
            Err(err) => {
                warn!(
                    "ssrc {:#010x}: failed to handle packet {}: {}",
                    stream.ssrc,
                    pkt.seq(),
                    err
                );
                return Err(err);
            }
        };

        if frames.is_empty() {
            stats.empty += 1;
            continue;
        }

        // codec parameters may only be known after the first frames
        if !got_magic {
            let magic = codec.format_magic()?;
            out.write_all(&magic)?;
            stats.bytes += magic.len();
            got_magic = true;
        }

        out.write_all(&frames)?;
        stats.packets += 1;
        stats.bytes += frames.len();
    }

    out.flush()?;
    Ok(stats)
}

#[cfg(test)]
mod test {
    use symphonia_core::codecs::decl_codec_type;

    use super::*;
    use crate::codec::{CodecMetadata, CodecOptions};
    use crate::errors::{invalid_state, payload_too_short, unsupported_payload, Error};
    use crate::rtp::RtpPacket;

    /// Learns its magic from the first packet, fails according to the first payload byte
    #[derive(Default)]
    struct Scripted {
        magic: Option<Vec<u8>>,
        resets: usize,
    }

    fn new_scripted() -> Box<dyn Codec> {
        Box::<Scripted>::default()
    }

    static SCRIPTED: CodecMetadata = CodecMetadata {
        codec: decl_codec_type(b"script"),
        name: "script",
        long_name: "Scripted codec",
        options: &[],
        init: new_scripted,
    };

    impl Codec for Scripted {
        fn metadata(&self) -> &'static CodecMetadata {
            &SCRIPTED
        }

        fn configure(&mut self, _options: &CodecOptions) -> Result<()> {
            Ok(())
        }

        fn reset(&mut self) {
            self.magic = None;
            self.resets += 1;
        }

        fn format_magic(&self) -> Result<Vec<u8>> {
            match &self.magic {
                Some(m) => Ok(m.clone()),
                None => invalid_state("magic unknown"),
            }
        }

        fn handle_packet(&mut self, pkt: &RtpPacket) -> Result<Vec<u8>> {
            match pkt.payload.first() {
                Some(0xee) => return payload_too_short(3, 1),
                Some(0xff) => return unsupported_payload("multiple frames"),
                Some(0x00) => return Ok(vec![]),
                _ => {}
            }
            self.magic.get_or_insert_with(|| b"#!S\n".to_vec());
            Ok(pkt.payload.clone())
        }
    }

    fn stream(payloads: &[&[u8]]) -> RtpStream {
        let mut s = RtpStream::new(1, 96);
        for (seq, p) in payloads.iter().enumerate() {
            s.add_packet(RtpPacket {
                sequence_number: seq as u16,
                payload: p.to_vec(),
                ..Default::default()
            });
        }
        s
    }

    #[test]
    fn test_magic_written_after_first_frame() {
        let mut codec = Scripted::default();
        let mut out = vec![];
        let s = stream(&[&[0x00], &[0xee], &[0x01, 0x02], &[0x03]]);
        let stats = dump_stream(&mut codec, &s, &mut out).unwrap();
        assert_eq!(out, b"#!S\n\x01\x02\x03");
        assert_eq!(
            stats,
            DumpStats {
                packets: 2,
                skipped: 1,
                empty: 1,
                bytes: 7
            }
        );
        assert_eq!(codec.resets, 1);
    }

    #[test]
    fn test_empty_output_not_counted_as_packet() {
        let mut codec = Scripted::default();
        let mut out = vec![];
        let s = stream(&[&[0x00], &[0x00], &[0x00]]);
        let stats = dump_stream(&mut codec, &s, &mut out).unwrap();
        assert!(out.is_empty());
        assert_eq!(stats.packets, 0);
        assert_eq!(stats.empty, 3);
        assert_eq!(stats.bytes, 0);
    }

    #[test]
    fn test_abort_on_unsupported_payload() {
        let mut codec = Scripted::default();
        let mut out = vec![];
        let s = stream(&[&[0x01], &[0xff], &[0x02]]);
        let err = dump_stream(&mut codec, &s, &mut out).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPayload(_)));
        assert_eq!(codec.resets, 1);
        assert!(codec.magic.is_none());
    }

    #[test]
    fn test_reset_gives_identical_output() {
        let mut codec = Scripted::default();
        let s = stream(&[&[0x05], &[0xee], &[0x06, 0x07]]);
        let mut first = vec![];
        let mut second = vec![];
        dump_stream(&mut codec, &s, &mut first).unwrap();
        dump_stream(&mut codec, &s, &mut second).unwrap();
        assert_eq!(first, second);
    }
}
