use bitvec::prelude::*;
use log::{debug, warn};

use rtpdump_core::errors::{payload_too_short, Result};

use crate::consts::{compact_format, IoMode, AMRWBIO_SID_TOC};
use crate::EvsToc;

/// Move AMR-WB IO speech bits to the start of the buffer.
///
/// A Compact AMR-WB IO payload starts with the 3 bit CMR, the speech bits follow. The
/// last bit of the payload becomes the first bit of the realigned buffer, in place of the
/// speech data's first bit, 3GPP TS 26.445 A.2.1.
pub fn realign_amrwb_io(payload: &[u8]) -> Vec<u8> {
    let bits = payload.view_bits::<Msb0>();
    let Some(last_bit) = bits.last().map(|b| *b) else {
        return vec![];
    };
    let n = bits.len();

    let mut out = bitvec![u8, Msb0; 0; n];
    out[..n - 4].copy_from_bitslice(&bits[3..n - 1]);
    out.set(0, last_bit);
    out.into_vec()
}

/// Storage frame of a Compact format payload, `None` when the payload size is not a
/// Compact format size.
pub fn compact_to_storage(payload: &[u8]) -> Option<Vec<u8>> {
    let format = compact_format(payload.len())?;

    let (toc, speech) = match format.mode {
        IoMode::Primary => (EvsToc::storage(format.frame_type), payload.to_vec()),
        IoMode::AMRWBIO => (
            EvsToc::storage(format.frame_type),
            realign_amrwb_io(payload),
        ),
        IoMode::Ambiguous if payload[0] & 0x80 == 0 => {
            (EvsToc::storage(format.frame_type), payload.to_vec())
        }
        IoMode::Ambiguous => {
            debug!("7 byte payload is an AMR-WB IO SID frame");
            (EvsToc(AMRWBIO_SID_TOC), payload[2..].to_vec())
        }
    };

    let mut frame = Vec::with_capacity(speech.len() + 1);
    frame.push(u8::from(toc));
    frame.extend(speech);
    Some(frame)
}

/// Storage frame of a Header-Full payload holding a single ToC and no CMR, `None` when
/// the payload carries a CMR byte or more than one frame.
pub fn header_full_to_storage(payload: &[u8]) -> Result<Option<Vec<u8>>> {
    let Some(&first) = payload.first() else {
        return payload_too_short(1, 0);
    };

    let toc = EvsToc(first);
    if toc.header_type() {
        warn!("CMR byte in header-full payload, frame dropped");
        return Ok(None);
    }
    if toc.followed() {
        warn!("more than one frame per header-full payload, frames dropped");
        return Ok(None);
    }

    if let Some(size) = toc.payload_size() {
        if size != payload.len() - 1 {
            warn!(
                "frame type {:?} carries {} bytes, payload has {}",
                toc.frame_type(),
                size,
                payload.len() - 1
            );
        }
    }

    let mut frame = Vec::with_capacity(payload.len());
    frame.push(first & 0x0f);
    frame.extend_from_slice(&payload[1..]);
    Ok(Some(frame))
}

#[cfg(test)]
mod test {
    use super::*;
    use rtpdump_core::errors::Error;

    #[test]
    fn test_realign() {
        assert_eq!(realign_amrwb_io(&[]), Vec::<u8>::new());
        // last bit moves to the front
        assert_eq!(realign_amrwb_io(&[0x00, 0x01]), vec![0x80, 0x00]);
        assert_eq!(realign_amrwb_io(&[0x1f, 0xe0]), vec![0x7f, 0x00]);
        let payload = hex::decode("a55a0ff0").unwrap();
        assert_eq!(realign_amrwb_io(&payload), hex::decode("2ad07f80").unwrap());
    }

    #[test]
    fn test_realign_keeps_length() {
        for f in crate::consts::COMPACT_FORMATS.iter().filter(|f| f.mode == IoMode::AMRWBIO) {
            let payload = vec![0xffu8; f.size];
            let out = realign_amrwb_io(&payload);
            assert_eq!(out.len(), f.size);
            // CMR bits are gone, the dropped last bit reappears in front
            assert_eq!(out[0], 0xff);
            assert_eq!(out[f.size - 1], 0xf0);
        }
    }

    #[test]
    fn test_compact_primary() {
        let payload = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66];
        let frame = compact_to_storage(&payload).unwrap();
        assert_eq!(frame[0], 0x0c);
        assert_eq!(&frame[1..], &payload);

        let payload = [0x5a; 61];
        let frame = compact_to_storage(&payload).unwrap();
        assert_eq!(frame[0], 0x06);
        assert_eq!(frame.len(), 62);
    }

    #[test]
    fn test_compact_amrwb_io() {
        let mut payload = vec![0u8; 17];
        payload[16] = 0x01;
        let frame = compact_to_storage(&payload).unwrap();
        assert_eq!(frame[0], 0x30);
        assert_eq!(frame[1], 0x80);
        assert!(frame[2..].iter().all(|&b| b == 0));

        let frame = compact_to_storage(&[0u8; 60]).unwrap();
        assert_eq!(frame[0], 0x38);
        assert_eq!(frame.len(), 61);
    }

    #[test]
    fn test_compact_ambiguous() {
        let primary = [0x7f, 1, 2, 3, 4, 5, 6];
        let frame = compact_to_storage(&primary).unwrap();
        assert_eq!(frame, vec![0x00, 0x7f, 1, 2, 3, 4, 5, 6]);

        let sid = [0x80, 1, 2, 3, 4, 5, 6];
        let frame = compact_to_storage(&sid).unwrap();
        assert_eq!(frame, vec![0x39, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_compact_unknown_size() {
        assert!(compact_to_storage(&[0; 8]).is_none());
        assert!(compact_to_storage(&[]).is_none());
    }

    #[test]
    fn test_header_full() {
        let frame = header_full_to_storage(&[0x04, 0xaa, 0xbb]).unwrap();
        assert_eq!(frame, Some(vec![0x04, 0xaa, 0xbb]));
        // Q bit is dropped along with the mode bit
        let frame = header_full_to_storage(&[0x35, 0x01]).unwrap();
        assert_eq!(frame, Some(vec![0x05, 0x01]));

        // CMR byte and continuation ToC are dropped, not errors
        assert_eq!(header_full_to_storage(&[0x84, 0x00]).unwrap(), None);
        assert_eq!(header_full_to_storage(&[0x44, 0x00]).unwrap(), None);
        assert!(matches!(
            header_full_to_storage(&[]),
            Err(Error::PayloadTooShort { .. })
        ));
    }
}
