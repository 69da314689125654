//! EVS re-framing from RTP payloads (3GPP TS 26.445 annex A) to the MIME storage format.

pub mod codec;
pub mod consts;
pub mod rtp;

use num_traits::FromPrimitive;
use symphonia_core::codecs::{decl_codec_type, CodecType};

use rtpdump_core::codec::{CodecMetadata, CodecOption};

use consts::{
    AMRWBIOFrameTypeIndex, FrameTypeIndex, PrimaryFrameTypeIndex, AMRWBIO_SID_TOC,
};

pub use codec::{new_evs, Evs};

pub const CODEC_TYPE_EVS: CodecType = decl_codec_type(b"evs");

pub const OPT_HEADER_FORMAT: &str = "header-format";

const HEADER_FORMAT_OPTION: CodecOption = CodecOption {
    name: OPT_HEADER_FORMAT,
    description: "EVS RTP payload format",
    required: true,
    valid_values: &["0", "1"],
    value_descriptions: &["Compact", "Header-Full"],
};

pub static EVS_METADATA: CodecMetadata = CodecMetadata {
    codec: CODEC_TYPE_EVS,
    name: "evs",
    long_name: "Enhanced Voice Services",
    options: &[HEADER_FORMAT_OPTION],
    init: new_evs,
};

/* 3GPP TS 26.445 A.2.2.1.2 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvsToc(pub u8);

impl EvsToc {
    /// ToC as stored in front of each frame, F and H bits clear, Q bit set for AMR-WB IO
    pub fn storage(ft: FrameTypeIndex) -> Self {
        match ft {
            FrameTypeIndex::Primary(ft) => Self(ft as u8),
            FrameTypeIndex::AMRWBIO(AMRWBIOFrameTypeIndex::SID) => Self(AMRWBIO_SID_TOC),
            FrameTypeIndex::AMRWBIO(ft) => Self(0x30 | ft as u8),
        }
    }

    /// Header type, set when this byte is a CMR instead of a ToC
    pub fn header_type(&self) -> bool {
        (self.0 & 0x80) == 0x80
    }

    /// Followed by another speech data
    pub fn followed(&self) -> bool {
        (self.0 & 0x40) == 0x40
    }

    /// EVS mode bit
    pub fn is_amrwb(&self) -> bool {
        (self.0 & 0x20) == 0x20
    }

    /// EVS frametype (~FT in amr toc)
    pub fn frame_type(&self) -> FrameTypeIndex {
        let idx = self.0 & 0x0f;
        if self.is_amrwb() {
            FrameTypeIndex::AMRWBIO(AMRWBIOFrameTypeIndex::from_u8(idx).unwrap_or_default())
        } else {
            FrameTypeIndex::Primary(PrimaryFrameTypeIndex::from_u8(idx).unwrap_or_default())
        }
    }

    pub fn payload_size(&self) -> Option<usize> {
        self.frame_type().payload_size()
    }
}

impl From<EvsToc> for u8 {
    fn from(toc: EvsToc) -> Self {
        toc.0
    }
}
