use std::io::ErrorKind;

use binrw::BinRead;
use log::{debug, info, warn};
use symphonia_core::errors::{decode_error, Error, Result};
use symphonia_core::io::{MediaSourceStream, ReadBytes};

use rtpdump_core::rtp::RtpPacket;
use rtpdump_core::stream::{RtpStream, StreamDemuxer};

use crate::format::{FileHeader, RecordHeader};

/// Sequential reader of an rtptools rtpdump capture
pub struct RtpdumpReader {
    source: MediaSourceStream,
    header: FileHeader,
    records: u64,
    rtcp: u64,
}

impl RtpdumpReader {
    pub fn try_new(mut source: MediaSourceStream) -> Result<Self> {
        let header = match FileHeader::read(&mut source) {
            Ok(hdr) => hdr,
            Err(binrw::Error::Io(e)) => return Err(Error::IoError(e)),
            Err(e) => {
                debug!("rtpdump header: {}", e);
                return decode_error("rtpdump: invalid file header");
            }
        };
        info!(
            "rtpdump recorded at {} from {:?}, start {}.{:06}",
            header.dst_addr(),
            header.src_addr(),
            header.start_sec,
            header.start_usec
        );

        Ok(Self {
            source,
            header,
            records: 0,
            rtcp: 0,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Records read so far, RTCP included
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Next record, `None` at end of file. A record cut short by the end of file ends
    /// the capture.
    pub fn next_record(&mut self) -> Result<Option<(RecordHeader, Box<[u8]>)>> {
        let len = match self.source.read_be_u16() {
            Ok(len) => len,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let read = |source: &mut MediaSourceStream| -> std::io::Result<_> {
            let plen = source.read_be_u16()?;
            let offset = source.read_be_u32()?;
            Ok((plen, offset))
        };
        let (plen, offset) = match read(&mut self.source) {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                warn!("rtpdump: truncated record header after {} records", self.records);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let rec = RecordHeader { len, plen, offset };
        let Some(data_len) = rec.data_len() else {
            return decode_error("rtpdump: record shorter than its header");
        };

        let data = match self.source.read_boxed_slice_exact(data_len) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                warn!("rtpdump: truncated record after {} records", self.records);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        self.records += 1;
        Ok(Some((rec, data)))
    }

    /// Next RTP packet, RTCP records and malformed packets are skipped.
    pub fn next_packet(&mut self) -> Result<Option<RtpPacket>> {
        while let Some((rec, data)) = self.next_record()? {
            if rec.is_rtcp() {
                self.rtcp += 1;
                continue;
            }

            match RtpPacket::parse(&data, self.header.start() + rec.offset()) {
                Ok(pkt) => return Ok(Some(pkt)),
                Err(e) => warn!("rtpdump: record {} skipped, {}", self.records, e),
            }
        }
        Ok(None)
    }

    /// Read the remaining packets and group them into streams.
    pub fn read_streams(&mut self) -> Result<Vec<RtpStream>> {
        let mut demuxer =
            StreamDemuxer::new().with_addrs(self.header.src_addr(), Some(self.header.dst_addr()));

        let mut dropped = 0;
        while let Some(pkt) = self.next_packet()? {
            if !demuxer.add_packet(pkt) {
                dropped += 1;
            }
        }

        info!(
            "{} records, {} rtcp, {} streams, {} packets dropped",
            self.records,
            self.rtcp,
            demuxer.len(),
            dropped
        );
        Ok(demuxer.into_streams())
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;
    use std::time::Duration;

    use super::*;

    fn capture(records: &[Vec<u8>]) -> Vec<u8> {
        let mut data = b"#!rtpplay1.0 127.0.0.1/5004\n".to_vec();
        data.extend(1_000u32.to_be_bytes());
        data.extend(0u32.to_be_bytes());
        data.extend([0; 8]);
        for rec in records {
            data.extend(rec);
        }
        data
    }

    fn record(plen: u16, offset: u32, data: &[u8]) -> Vec<u8> {
        let mut rec = ((data.len() + 8) as u16).to_be_bytes().to_vec();
        rec.extend(plen.to_be_bytes());
        rec.extend(offset.to_be_bytes());
        rec.extend(data);
        rec
    }

    fn rtp(ssrc: u32, pt: u8, seq: u16, ts: u32) -> Vec<u8> {
        let mut pkt = vec![0x80, pt];
        pkt.extend(seq.to_be_bytes());
        pkt.extend(ts.to_be_bytes());
        pkt.extend(ssrc.to_be_bytes());
        pkt.extend([0xf0, 0x04, 0, 0]);
        pkt.extend([0; 10]);
        pkt
    }

    fn rtp_record(ssrc: u32, pt: u8, seq: u16, ts: u32, offset: u32) -> Vec<u8> {
        let pkt = rtp(ssrc, pt, seq, ts);
        record(pkt.len() as u16, offset, &pkt)
    }

    fn reader(data: Vec<u8>) -> RtpdumpReader {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
        RtpdumpReader::try_new(mss).unwrap()
    }

    #[test]
    fn test_packets() {
        let mut r = reader(capture(&[
            rtp_record(0xabc, 96, 1, 0, 0),
            record(0, 10, &[0x81, 0xc8, 0, 6]),
            rtp_record(0xabc, 96, 2, 160, 20),
        ]));
        assert_eq!(r.header().dst_addr(), "127.0.0.1:5004".parse().unwrap());
        assert_eq!(r.header().src_addr(), None);

        let first = r.next_packet().unwrap().unwrap();
        assert_eq!(first.ssrc, 0xabc);
        assert_eq!(first.payload_type, 96);
        assert_eq!(first.received_at, Duration::from_secs(1000));
        assert_eq!(first.payload().len(), 14);

        let second = r.next_packet().unwrap().unwrap();
        assert_eq!(second.seq(), 2);
        assert_eq!(second.received_at, Duration::from_millis(1_000_020));
        assert!(r.next_packet().unwrap().is_none());
        assert_eq!(r.records(), 3);
    }

    #[test]
    fn test_malformed_packets_skipped() {
        let mut r = reader(capture(&[
            record(5, 0, &[0x40, 0, 0, 0, 0]),
            rtp_record(1, 8, 7, 0, 0),
        ]));
        assert_eq!(r.next_packet().unwrap().unwrap().seq(), 7);
        assert!(r.next_packet().unwrap().is_none());
    }

    #[test]
    fn test_truncated_capture() {
        let mut data = capture(&[rtp_record(1, 8, 7, 0, 0)]);
        let mut last = rtp_record(1, 8, 8, 160, 20);
        last.truncate(12);
        data.extend(last);
        let mut r = reader(data);
        assert!(r.next_packet().unwrap().is_some());
        assert!(r.next_packet().unwrap().is_none());
    }

    #[test]
    fn test_short_record() {
        let mut data = capture(&[]);
        data.extend([0, 4, 0, 0, 0, 0, 0, 0]);
        let mut r = reader(data);
        assert!(r.next_record().is_err());
    }

    #[test]
    fn test_invalid_header() {
        let mss = MediaSourceStream::new(
            Box::new(Cursor::new(b"RIFF\0\0\0\0WAVEfmt ".to_vec())),
            Default::default(),
        );
        assert!(RtpdumpReader::try_new(mss).is_err());
    }

    #[test]
    fn test_read_streams() {
        let mut r = reader(capture(&[
            rtp_record(1, 96, 10, 0, 0),
            rtp_record(2, 8, 500, 0, 5),
            rtp_record(1, 96, 11, 160, 20),
            rtp_record(1, 96, 11, 160, 21),
            rtp_record(1, 101, 12, 320, 40),
        ]));
        let streams = r.read_streams().unwrap();
        assert_eq!(streams.len(), 3);
        assert_eq!((streams[0].ssrc, streams[0].payload_type), (1, 96));
        assert_eq!(streams[0].len(), 2);
        assert_eq!(streams[1].ssrc, 2);
        assert_eq!(streams[2].payload_type, 101);
        assert_eq!(streams[0].dst, Some("127.0.0.1:5004".parse().unwrap()));
    }
}
