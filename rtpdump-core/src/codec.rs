use std::collections::HashMap;
use std::fmt;

use symphonia_core::codecs::CodecType;

use crate::errors::{Error, Result};
use crate::rtp::RtpPacket;

/// Codec options, option name to option value
pub type CodecOptions = HashMap<String, String>;

/// Declaration of one codec option and its valid values.
#[derive(Clone, Copy, Debug)]
pub struct CodecOption {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub valid_values: &'static [&'static str],
    /// Human readable meaning of each entry of `valid_values`
    pub value_descriptions: &'static [&'static str],
}

impl CodecOption {
    pub fn is_valid(&self, value: &str) -> bool {
        self.valid_values.contains(&value)
    }
}

/// Static description of a codec engine.
pub struct CodecMetadata {
    pub codec: CodecType,
    pub name: &'static str,
    pub long_name: &'static str,
    pub options: &'static [CodecOption],
    /// Create an unconfigured codec instance
    pub init: fn() -> Box<dyn Codec>,
}

impl CodecMetadata {
    pub fn option(&self, name: &str) -> Option<&'static CodecOption> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Reject unknown options, values outside of the declared set and missing required options.
    pub fn validate(&self, options: &CodecOptions) -> Result<()> {
        for (name, value) in options {
            let opt = self
                .option(name)
                .ok_or_else(|| Error::UnknownOption(name.clone()))?;
            if !opt.is_valid(value) {
                return Err(Error::InvalidOptionValue {
                    name: name.clone(),
                    value: value.clone(),
                    valid: opt.valid_values.join(", "),
                });
            }
        }

        match self
            .options
            .iter()
            .find(|o| o.required && !options.contains_key(o.name))
        {
            Some(missing) => Err(Error::MissingOption(missing.name)),
            None => Ok(()),
        }
    }

    /// Create a configured and initialized codec instance.
    pub fn make(&self, options: &CodecOptions) -> Result<Box<dyn Codec>> {
        let mut codec = (self.init)();
        codec.configure(options)?;
        codec.init();
        Ok(codec)
    }
}

impl fmt::Debug for CodecMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecMetadata")
            .field("codec", &self.codec)
            .field("name", &self.name)
            .field("options", &self.options)
            .finish()
    }
}

impl fmt::Display for CodecMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} - {}", self.name, self.long_name)?;
        for opt in self.options {
            let required = if opt.required { " (required)" } else { "" };
            writeln!(f, "  {}{}: {}", opt.name, required, opt.description)?;
            for (value, desc) in opt.valid_values.iter().zip(opt.value_descriptions) {
                writeln!(f, "      {:<6} {}", value, desc)?;
            }
        }
        Ok(())
    }
}

/// RTP payload to storage format transcoder.
///
/// One instance serves one stream at a time, call [`Codec::reset`] before reusing it for
/// another stream. Packets must be handed over in sequence order.
pub trait Codec: Send {
    fn metadata(&self) -> &'static CodecMetadata;

    /// Validate and record codec options, fails once packets have been processed.
    fn configure(&mut self, options: &CodecOptions) -> Result<()>;

    fn init(&mut self) {}

    /// Forget all per stream state, keep the configuration.
    fn reset(&mut self);

    /// Header written once at the start of the output file.
    fn format_magic(&self) -> Result<Vec<u8>>;

    /// Transcode one packet into zero or more storage format bytes: loss filler frames
    /// first, then the frame carried by `pkt`.
    fn handle_packet(&mut self, pkt: &RtpPacket) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod test {
    use super::*;
    use symphonia_core::codecs::decl_codec_type;

    struct Passthrough;

    impl Codec for Passthrough {
        fn metadata(&self) -> &'static CodecMetadata {
            &TEST_METADATA
        }

        fn configure(&mut self, options: &CodecOptions) -> Result<()> {
            TEST_METADATA.validate(options)
        }

        fn reset(&mut self) {}

        fn format_magic(&self) -> Result<Vec<u8>> {
            Ok(b"#!TEST\n".to_vec())
        }

        fn handle_packet(&mut self, pkt: &RtpPacket) -> Result<Vec<u8>> {
            Ok(pkt.payload.clone())
        }
    }

    fn new_passthrough() -> Box<dyn Codec> {
        Box::new(Passthrough)
    }

    static TEST_METADATA: CodecMetadata = CodecMetadata {
        codec: decl_codec_type(b"test"),
        name: "test",
        long_name: "Test codec",
        options: &[
            CodecOption {
                name: "mode",
                description: "mode",
                required: true,
                valid_values: &["a", "b"],
                value_descriptions: &["mode a", "mode b"],
            },
            CodecOption {
                name: "extra",
                description: "extra",
                required: false,
                valid_values: &["0", "1"],
                value_descriptions: &["off", "on"],
            },
        ],
        init: new_passthrough,
    };

    fn opts(kv: &[(&str, &str)]) -> CodecOptions {
        kv.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_validate_options() {
        assert!(TEST_METADATA.validate(&opts(&[("mode", "a")])).is_ok());
        assert!(TEST_METADATA
            .validate(&opts(&[("mode", "b"), ("extra", "1")]))
            .is_ok());
        assert!(matches!(
            TEST_METADATA.validate(&opts(&[("mode", "c")])),
            Err(Error::InvalidOptionValue { .. })
        ));
        assert!(matches!(
            TEST_METADATA.validate(&opts(&[("mode", "a"), ("foo", "1")])),
            Err(Error::UnknownOption(_))
        ));
        assert!(matches!(
            TEST_METADATA.validate(&opts(&[("extra", "0")])),
            Err(Error::MissingOption("mode"))
        ));
    }

    #[test]
    fn test_make_codec() {
        assert!(TEST_METADATA.make(&opts(&[])).is_err());
        let codec = TEST_METADATA.make(&opts(&[("mode", "a")])).unwrap();
        assert_eq!(codec.metadata().name, "test");
        assert_eq!(codec.format_magic().unwrap(), b"#!TEST\n");
    }

    #[test]
    fn test_describe() {
        let desc = TEST_METADATA.to_string();
        assert!(desc.starts_with("test - Test codec\n"));
        assert!(desc.contains("mode (required): mode"));
        assert!(desc.contains("b      mode b"));
    }
}
