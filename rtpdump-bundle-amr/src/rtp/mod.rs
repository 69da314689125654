//! RTP payload format for AMR and AMR-WB, RFC 4867.
//!
//! Only single frame payloads are handled, both octet-aligned and bandwidth-efficient.

use bitvec::prelude::*;
use log::{debug, info};

use rtpdump_core::errors::{payload_too_short, unsupported_payload, Error, Result};

use crate::consts::{Alignment, Band};

/// Payload table of content entry, RFC 4867 section 4.3.2
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Toc(pub u8);

impl Toc {
    /// Table of content of an octet-aligned payload
    pub fn octet_aligned(payload: &[u8]) -> Self {
        Self(payload[1])
    }

    /// Table of content of a bandwidth-efficient payload, the 6 bits following the CMR
    /// re-packed as in octet-aligned mode.
    pub fn bandwidth_efficient(payload: &[u8]) -> Self {
        let bits = payload[..2].view_bits::<Msb0>();
        Self(bits[4..10].load_be::<u8>() << 2)
    }

    pub fn followed_by_another_speech_frame(&self) -> bool {
        (self.0 >> 7) == 1
    }

    pub fn frame_type(&self) -> u8 {
        (self.0 >> 3) & 0x0f
    }

    pub fn quality(&self) -> bool {
        ((self.0 >> 2) & 1) == 1
    }
}

/// Storage format frame header `[0][FT][Q][0][0]`, RFC 4867 section 5.3
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameHeader(pub u8);

impl From<Toc> for FrameHeader {
    fn from(toc: Toc) -> Self {
        Self(toc.0 & 0b0111_1100)
    }
}

fn cmr(payload: &[u8]) -> u8 {
    payload[0] >> 4
}

/// Speech bits of a bandwidth-efficient payload start at bit 10, move them to a byte
/// boundary. Output byte `k` holds the low 6 bits of payload byte `k + 1` and the top
/// 2 bits of payload byte `k + 2`, the last output byte ends with 2 zero bits.
pub fn shift_speech_bits(payload: &[u8], size: usize) -> Result<Vec<u8>> {
    if size == 0 {
        return Ok(vec![]);
    }
    if payload.len() < size + 1 {
        return payload_too_short(size + 1, payload.len());
    }

    let src = &payload[1..size + 1].view_bits::<Msb0>()[2..];
    let mut speech = bitvec![u8, Msb0; 0; size * 8];
    speech[..src.len()].copy_from_bitslice(src);
    Ok(speech.into_vec())
}

/// Convert a single frame octet-aligned payload
/// `[CMR:4][R:4][F][FT:4][Q][P:2][speech..]` to a storage format frame.
pub fn octet_aligned_to_storage(payload: &[u8], band: Band) -> Result<Vec<u8>> {
    if payload.len() < 2 {
        return payload_too_short(2, payload.len());
    }

    let toc = Toc::octet_aligned(payload);
    debug!(
        "octet-aligned, last frame: {}, cmr: {}, frame type: {}, quality: {}",
        !toc.followed_by_another_speech_frame(),
        cmr(payload),
        toc.frame_type(),
        toc.quality()
    );
    if toc.followed_by_another_speech_frame() {
        return unsupported_payload("more than one frame per payload");
    }

    let size = band.frame_size(toc.frame_type());
    if payload.len() < size + 2 {
        return payload_too_short(size + 2, payload.len());
    }

    let mut frame = Vec::with_capacity(size + 1);
    frame.push(FrameHeader::from(toc).0);
    frame.extend_from_slice(&payload[2..size + 2]);
    Ok(frame)
}

/// Convert a single frame bandwidth-efficient payload
/// `[CMR:4][F][FT:4][Q][speech..]` to a storage format frame.
pub fn bandwidth_efficient_to_storage(payload: &[u8], band: Band) -> Result<Vec<u8>> {
    if payload.len() < 2 {
        return payload_too_short(2, payload.len());
    }

    let toc = Toc::bandwidth_efficient(payload);
    debug!(
        "bandwidth-efficient, last frame: {}, cmr: {}, frame type: {}, quality: {}",
        !toc.followed_by_another_speech_frame(),
        cmr(payload),
        toc.frame_type(),
        toc.quality()
    );
    if toc.followed_by_another_speech_frame() {
        return unsupported_payload("more than one frame per payload");
    }

    let size = band.frame_size(toc.frame_type());
    let speech = shift_speech_bits(payload, size)?;

    let mut frame = Vec::with_capacity(size + 1);
    frame.push(FrameHeader::from(toc).0);
    frame.extend_from_slice(&speech);
    Ok(frame)
}

/// Infer payload layout and band from a single frame payload, honoring the already known
/// parameters. Candidates are tried in order octet-aligned NB, octet-aligned WB,
/// bandwidth-efficient NB, bandwidth-efficient WB; the first one whose frame size matches
/// the payload length, allowing up to 2 padding bytes, wins.
pub fn detect_parameters(
    payload: &[u8],
    alignment: Option<Alignment>,
    band: Option<Band>,
) -> Result<(Alignment, Band)> {
    // a payload made of the AMR header only, likely a "no data" frame
    if payload.len() < 3 {
        return payload_too_short(3, payload.len());
    }

    let oa_ft = Toc::octet_aligned(payload).frame_type();
    let be_ft = Toc::bandwidth_efficient(payload).frame_type();
    debug!(
        "expected OA type {} NB frame size: {}, WB: {}, actual: {}",
        oa_ft,
        Band::Narrow.frame_size(oa_ft),
        Band::Wide.frame_size(oa_ft),
        payload.len()
    );
    debug!(
        "expected BE type {} NB frame size: {}, WB: {}, actual: {}",
        be_ft,
        Band::Narrow.frame_size(be_ft),
        Band::Wide.frame_size(be_ft),
        payload.len()
    );

    let size_matches = |size: usize| size > 0 && (size..size + 3).contains(&payload.len());

    // the 4 reserved bits after the CMR are zero in octet-aligned mode
    let oa_signature = (payload[0] & 0x0f) == 0;

    let candidates = [
        (Alignment::OctetAligned, Band::Narrow, oa_ft),
        (Alignment::OctetAligned, Band::Wide, oa_ft),
        (Alignment::BandwidthEfficient, Band::Narrow, be_ft),
        (Alignment::BandwidthEfficient, Band::Wide, be_ft),
    ];
    let found = candidates.into_iter().find(|(a, b, ft)| {
        alignment.map_or(true, |known| known == *a)
            && band.map_or(true, |known| known == *b)
            && (*a == Alignment::BandwidthEfficient || oa_signature)
            && size_matches(b.frame_size(*ft))
    });

    match found {
        Some((a, b, _)) => {
            info!("detected {:?} {:?} band AMR frame", a, b);
            Ok((a, b))
        }
        None => Err(Error::DetectionFailed(payload.len())),
    }
}
