use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

pub const AMR_SAMPLE_RATE: u32 = 8000;
pub const AMRWB_SAMPLE_RATE: u32 = 16000;

pub const AMR_MIME_MAGIC: &[u8] = b"#!AMR\n";
pub const AMRWB_MIME_MAGIC: &[u8] = b"#!AMR-WB\n";

/// Frame type index of AMR-NB, see 3GPP TS 26.101 table 1a
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, FromPrimitive, PartialEq, Eq)]
pub enum AmrFrameTypeIndex {
    Amr475 = 0,
    Amr515 = 1,
    Amr590 = 2,
    Amr670 = 3,
    Amr740 = 4,
    Amr795 = 5,
    Amr1020 = 6,
    Amr1220 = 7,
    Sid = 8,
    GsmEfrSid = 9,
    TdmaSid = 10,
    PdcSid = 11,
    Future12 = 12,
    Future13 = 13,
    Future14 = 14,
    #[default]
    NoData = 15,
}

impl AmrFrameTypeIndex {
    pub fn from_index(idx: u8) -> Self {
        Self::from_u8(idx & 0x0f).unwrap_or_default()
    }

    /// Speech bytes following the frame header
    pub const fn payload_size(self) -> usize {
        match self {
            Self::Amr475 => 12,
            Self::Amr515 => 13,
            Self::Amr590 => 15,
            Self::Amr670 => 17,
            Self::Amr740 => 19,
            Self::Amr795 => 20,
            Self::Amr1020 => 26,
            Self::Amr1220 => 31,
            Self::Sid => 5,
            _ => 0,
        }
    }
}

/// Frame type index of AMR-WB, see 3GPP TS 26.201 table 1a
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, FromPrimitive, PartialEq, Eq)]
pub enum AmrwbFrameTypeIndex {
    Amrwb660 = 0,
    Amrwb885 = 1,
    Amrwb1265 = 2,
    Amrwb1425 = 3,
    Amrwb1585 = 4,
    Amrwb1825 = 5,
    Amrwb1985 = 6,
    Amrwb2305 = 7,
    Amrwb2385 = 8,
    Sid = 9,
    Future10 = 10,
    Future11 = 11,
    Future12 = 12,
    Future13 = 13,
    SpeechLost = 14,
    #[default]
    NoData = 15,
}

impl AmrwbFrameTypeIndex {
    pub fn from_index(idx: u8) -> Self {
        Self::from_u8(idx & 0x0f).unwrap_or_default()
    }

    pub const fn payload_size(self) -> usize {
        match self {
            Self::Amrwb660 => 17,
            Self::Amrwb885 => 23,
            Self::Amrwb1265 => 32,
            Self::Amrwb1425 => 36,
            Self::Amrwb1585 => 40,
            Self::Amrwb1825 => 46,
            Self::Amrwb1985 => 50,
            Self::Amrwb2305 => 58,
            Self::Amrwb2385 => 60,
            Self::Sid => 5,
            _ => 0,
        }
    }
}

/// AMR band, narrow band AMR or wide band AMR-WB
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    Narrow,
    Wide,
}

impl Band {
    pub const fn sample_rate(self) -> u32 {
        match self {
            Self::Narrow => AMR_SAMPLE_RATE,
            Self::Wide => AMRWB_SAMPLE_RATE,
        }
    }

    /// RTP timestamp increment of one 20ms frame
    pub const fn samples_per_frame(self) -> u32 {
        self.sample_rate() / 50
    }

    pub const fn magic(self) -> &'static [u8] {
        match self {
            Self::Narrow => AMR_MIME_MAGIC,
            Self::Wide => AMRWB_MIME_MAGIC,
        }
    }

    /// Storage format header of the "no data" frame written for each lost frame
    pub const fn no_data_frame(self) -> u8 {
        match self {
            Self::Narrow => 0x7c,
            Self::Wide => 0xfc,
        }
    }

    /// Speech bytes of frame type `idx`, 0 for frames without speech data
    pub fn frame_size(self, idx: u8) -> usize {
        match self {
            Self::Narrow => AmrFrameTypeIndex::from_index(idx).payload_size(),
            Self::Wide => AmrwbFrameTypeIndex::from_index(idx).payload_size(),
        }
    }
}

/// RTP payload layout, RFC 4867 section 4.3 and 4.4
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    BandwidthEfficient,
    OctetAligned,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_frame_sizes() {
        let nb: Vec<_> = (0..16).map(|ft| Band::Narrow.frame_size(ft)).collect();
        assert_eq!(nb, [12, 13, 15, 17, 19, 20, 26, 31, 5, 0, 0, 0, 0, 0, 0, 0]);
        let wb: Vec<_> = (0..16).map(|ft| Band::Wide.frame_size(ft)).collect();
        assert_eq!(wb, [17, 23, 32, 36, 40, 46, 50, 58, 60, 5, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_frame_type_index_masked() {
        assert_eq!(AmrFrameTypeIndex::from_index(0x17), AmrFrameTypeIndex::Amr1220);
        assert_eq!(AmrwbFrameTypeIndex::from_index(0xf8), AmrwbFrameTypeIndex::Amrwb2385);
    }

    #[test]
    fn test_band() {
        assert_eq!(Band::Narrow.samples_per_frame(), 160);
        assert_eq!(Band::Wide.samples_per_frame(), 320);
        assert_eq!(Band::Wide.magic(), b"#!AMR-WB\n");
        assert_eq!(Band::Narrow.no_data_frame(), 0x7c);
    }
}
