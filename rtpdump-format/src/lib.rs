//! Reader of rtptools `rtpdump` captures (`#!rtpplay1.0`).

use std::fs::File;
use std::path::Path;

use symphonia_core::errors::Result;
use symphonia_core::io::MediaSourceStream;

pub mod format;
mod reader;

pub use format::{FileHeader, RecordHeader, MAGIC};
pub use reader::RtpdumpReader;

/// Open an rtpdump file and read its file header.
pub fn open<P: AsRef<Path>>(path: P) -> Result<RtpdumpReader> {
    let file = File::open(path)?;
    RtpdumpReader::try_new(MediaSourceStream::new(Box::new(file), Default::default()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_open_missing_file() {
        assert!(open("/nonexistent/capture.rtpdump").is_err());
    }
}
