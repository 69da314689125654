//! AMR and AMR-WB re-framing from RTP payloads (RFC 4867) to the storage format.

pub mod codec;
pub mod consts;
pub mod rtp;

use symphonia_core::codecs::{decl_codec_type, CodecType};

use rtpdump_core::codec::{CodecMetadata, CodecOption};

pub use codec::{new_amr, Amr};
pub use consts::{Alignment, Band};

pub const CODEC_TYPE_AMR: CodecType = decl_codec_type(b"amr");

pub const OPT_OCTET_ALIGNED: &str = "octet-aligned";
pub const OPT_SAMPLE_RATE: &str = "sample-rate";

const SAMPLE_RATE_OPTION: CodecOption = CodecOption {
    name: OPT_SAMPLE_RATE,
    description: "whether this payload is narrow or wide band",
    required: false,
    valid_values: &["nb", "wb", "auto"],
    value_descriptions: &["Narrow Band (8000)", "Wide Band (16000)", "Detect automatically"],
};

const OCTET_ALIGNED_OPTION: CodecOption = CodecOption {
    name: OPT_OCTET_ALIGNED,
    description: "whether this payload is octet-aligned or bandwidth-efficient",
    required: false,
    valid_values: &["0", "1", "auto"],
    value_descriptions: &["bandwidth-efficient", "octet-aligned", "Detect automatically"],
};

pub static AMR_METADATA: CodecMetadata = CodecMetadata {
    codec: CODEC_TYPE_AMR,
    name: "amr",
    long_name: "Adaptive Multi Rate",
    options: &[SAMPLE_RATE_OPTION, OCTET_ALIGNED_OPTION],
    init: new_amr,
};
