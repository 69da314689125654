use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// How the dump driver reacts to an [`Error`] returned for one packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Drop the packet and continue with the stream.
    Skip,
    /// Stop the current stream and discard its output.
    Abort,
    /// Usage error, surfaced to the caller immediately.
    Fatal,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("invalid value '{value}' for option '{name}', valid values: [{valid}]")]
    InvalidOptionValue {
        name: String,
        value: String,
        valid: String,
    },
    #[error("required option '{0}' not present")]
    MissingOption(&'static str),
    #[error("payload is too short: {actual} bytes, expecting at least {expected}")]
    PayloadTooShort { expected: usize, actual: usize },
    #[error("out of sequence packet {seq}, last accepted {last}")]
    OutOfSequence { last: u16, seq: u16 },
    #[error("unable to detect codec parameters from {0} bytes payload")]
    DetectionFailed(usize),
    #[error("unsupported payload: {0}")]
    UnsupportedPayload(&'static str),
    #[error("invalid rtp packet: {0}")]
    InvalidPacket(&'static str),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    pub fn disposition(&self) -> Disposition {
        match self {
            Error::PayloadTooShort { .. } | Error::OutOfSequence { .. } => Disposition::Skip,
            Error::DetectionFailed(_)
            | Error::UnsupportedPayload(_)
            | Error::InvalidPacket(_)
            | Error::IoError(_) => Disposition::Abort,
            Error::InvalidState(_)
            | Error::UnknownOption(_)
            | Error::InvalidOptionValue { .. }
            | Error::MissingOption(_) => Disposition::Fatal,
        }
    }

    pub fn is_skip(&self) -> bool {
        self.disposition() == Disposition::Skip
    }
}

pub fn invalid_state<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvalidState(desc))
}

pub fn unsupported_payload<T>(desc: &'static str) -> Result<T> {
    Err(Error::UnsupportedPayload(desc))
}

pub fn payload_too_short<T>(expected: usize, actual: usize) -> Result<T> {
    Err(Error::PayloadTooShort { expected, actual })
}
