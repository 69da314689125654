//! RTP stream reconstruction and the codec contract shared by the re-framing engines.

pub mod codec;
pub mod dump;
pub mod errors;
pub mod rtp;
pub mod stream;

pub use codec::{Codec, CodecMetadata, CodecOption, CodecOptions};
pub use dump::{dump_stream, DumpStats};
pub use errors::{Disposition, Error, Result};
pub use rtp::{parse_rtp_event, RtpEvent, RtpPacket};
pub use stream::{is_newer_seq, is_seq_wrap, RtpStream, StreamDemuxer};
