use anyhow::{bail, Result};
use clap::ArgMatches;

use rtpdump_bundle_amr::AMR_METADATA;
use rtpdump_bundle_evs::EVS_METADATA;
use rtpdump_core::codec::CodecMetadata;

pub static CODECS: &[&CodecMetadata] = &[&AMR_METADATA, &EVS_METADATA];

pub fn find(name: &str) -> Option<&'static CodecMetadata> {
    CODECS.iter().copied().find(|c| c.name == name)
}

pub fn list(args: &ArgMatches) -> Result<i32> {
    match args.get_one::<String>("NAME") {
        Some(name) => match find(name) {
            Some(codec) => print!("{}", codec),
            None => bail!("unknown codec '{}'", name),
        },
        None => {
            for codec in CODECS {
                println!("{}", codec);
            }
        }
    }
    Ok(0)
}
