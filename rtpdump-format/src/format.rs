use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use binrw::{BinRead, BinResult};

pub const MAGIC: &[u8] = b"#!rtpplay1.0 ";

/// Longest textual IPv6 address
const MAX_ADDR_LEN: usize = 45;

#[allow(unused_variables)]
#[binrw::parser(reader, endian)]
fn parse_addr() -> BinResult<IpAddr> {
    let pos = reader.stream_position()?;
    let mut ip = vec![];

    loop {
        let char = &mut [0];
        reader.read_exact(char)?;
        if char[0] == b'/' {
            break;
        }
        if ip.len() == MAX_ADDR_LEN {
            return Err(binrw::Error::AssertFail {
                pos,
                message: "address in rtpplay line too long".into(),
            });
        }
        ip.push(char[0]);
    }

    let ip = String::from_utf8_lossy(&ip);
    if ip.contains('.') {
        let ip = Ipv4Addr::from_str(&ip).map_err(|e| binrw::Error::Custom { pos, err: Box::new(e) })?;
        Ok(IpAddr::V4(ip))
    } else {
        let ip = Ipv6Addr::from_str(&ip).map_err(|e| binrw::Error::Custom { pos, err: Box::new(e) })?;
        Ok(IpAddr::V6(ip))
    }
}

#[allow(unused_variables)]
#[binrw::parser(reader, endian)]
fn parse_port() -> BinResult<u16> {
    let pos = reader.stream_position()?;
    let port: &mut [u8] = &mut [0; 6];
    let mut len = 0;

    for c in port.iter_mut() {
        let char = &mut [0];
        reader.read_exact(char)?;
        if char[0] == b'\n' {
            break;
        }
        *c = char[0];
        len += 1;
    }

    String::from_utf8_lossy(&port[..len])
        .parse::<u16>()
        .map_err(|e| binrw::Error::Custom { pos, err: Box::new(e) })
}

/// `#!rtpplay1.0 address/port\n` line followed by the binary file header of rtptools
#[derive(BinRead, Clone, Copy, Debug)]
#[br(big, magic = b"#!rtpplay1.0 ")]
pub struct FileHeader {
    #[br(parse_with = parse_addr)]
    pub ip: IpAddr,
    #[br(parse_with = parse_port)]
    pub port: u16,
    pub start_sec: u32,
    pub start_usec: u32,
    /// Source address, 0 when unknown
    pub source: u32,
    pub source_port: u16,
    pub padding: u16,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
            start_sec: 0,
            start_usec: 0,
            source: 0,
            source_port: 0,
            padding: 0,
        }
    }
}

impl FileHeader {
    /// Recording start since UNIX EPOCH
    pub fn start(&self) -> Duration {
        Duration::new(self.start_sec as u64, self.start_usec.saturating_mul(1000))
    }

    /// Address of the rtpplay line
    pub fn dst_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    pub fn src_addr(&self) -> Option<SocketAddr> {
        match self.source {
            0 => None,
            ip => Some(SocketAddr::new(Ipv4Addr::from(ip).into(), self.source_port)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecordHeader {
    /// length of record, including this header (may be smaller than plen if not whole packet recorded)
    pub len: u16,
    /// actual header+payload length for RTP, 0 for RTCP
    pub plen: u16,
    /// milliseconds since the start of recording
    pub offset: u32,
}

impl RecordHeader {
    pub const SIZE: usize = 8;

    pub fn is_rtcp(&self) -> bool {
        self.plen == 0
    }

    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.offset as u64)
    }

    /// Recorded bytes following this header
    pub fn data_len(&self) -> Option<usize> {
        (self.len as usize).checked_sub(Self::SIZE)
    }
}
