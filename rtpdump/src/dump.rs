use std::fs::{self, File};
use std::io::BufWriter;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use log::{error, info, warn};

use rtpdump_core::codec::{Codec, CodecMetadata, CodecOptions};
use rtpdump_core::dump::{dump_stream, DumpStats};
use rtpdump_core::stream::RtpStream;

use crate::{codecs, options};

/// `out.amr` becomes `out_s3.amr` for the third stream
pub fn output_name(output: &Path, index: usize) -> PathBuf {
    let stem = output.file_stem().unwrap_or(output.as_os_str()).to_string_lossy();
    let name = match output.extension() {
        Some(ext) => format!("{}_s{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_s{}", stem, index),
    };
    output.with_file_name(name)
}

/// Dump one stream into `path`, the file is removed when the stream cannot be dumped.
pub fn dump_to_file(codec: &mut dyn Codec, stream: &RtpStream, path: &Path) -> Result<DumpStats> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);

    match dump_stream(codec, stream, &mut out) {
        Ok(stats) => Ok(stats),
        Err(err) => {
            drop(out);
            if let Err(e) = fs::remove_file(path) {
                warn!("failed to remove {}: {}", path.display(), e);
            }
            Err(err).with_context(|| format!("failed to decode stream {:#010x}", stream.ssrc))
        }
    }
}

fn dump_one(
    meta: &CodecMetadata,
    options: &CodecOptions,
    stream: &RtpStream,
    path: &Path,
) -> Result<DumpStats> {
    let mut codec = meta.make(options)?;
    let stats = dump_to_file(codec.as_mut(), stream, path)?;
    info!(
        "{}: {} packets, {} skipped, {} without output, {} bytes",
        path.display(),
        stats.packets,
        stats.skipped,
        stats.empty,
        stats.bytes
    );
    Ok(stats)
}

/// Number of dump threads when `--jobs` is not given
pub fn default_jobs() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Dump every stream on at most `jobs` threads, returns the number of failed streams.
pub fn dump_all(
    meta: &CodecMetadata,
    options: &CodecOptions,
    streams: &[RtpStream],
    output: &Path,
    jobs: usize,
) -> usize {
    let workers = jobs.clamp(1, streams.len().max(1));
    info!("dumping {} streams on {} threads", streams.len(), workers);

    let next = AtomicUsize::new(0);
    let mut results: Vec<(usize, PathBuf, Result<DumpStats>)> = thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                s.spawn(|| {
                    let mut done = vec![];
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(stream) = streams.get(idx) else {
                            break;
                        };
                        let path = output_name(output, idx + 1);
                        let result = dump_one(meta, options, stream, &path);
                        done.push((idx, path, result));
                    }
                    done
                })
            })
            .collect();

        let mut results = vec![];
        for handle in handles {
            match handle.join() {
                Ok(done) => results.extend(done),
                Err(_) => error!("dump thread panicked"),
            }
        }
        results
    });
    results.sort_by_key(|(idx, _, _)| *idx);

    let mut failed = streams.len() - results.len();
    for (idx, path, result) in results {
        if let Err(err) = result {
            error!("stream {} ({}): {:#}", idx + 1, path.display(), err);
            failed += 1;
        }
    }
    failed
}

pub fn run(args: &ArgMatches) -> Result<i32> {
    let input = args.get_one::<PathBuf>("INPUT").context("missing input file")?;
    let output = args.get_one::<PathBuf>("output").context("missing output file")?;
    let name = args.get_one::<String>("codec").context("missing codec")?;

    let Some(meta) = codecs::find(name) else {
        bail!("invalid codec name, see available codecs using \"codecs list\" command");
    };

    let options = options::load(
        args.get_one::<PathBuf>("options-file").map(PathBuf::as_path),
        args.get_one::<String>("flags").map(String::as_str),
    )?;
    meta.validate(&options)?;

    let mut reader = rtpdump_format::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let streams = reader.read_streams()?;
    if streams.is_empty() {
        println!("no streams found");
        return Ok(0);
    }

    match args.get_one::<u64>("stream").map(|&i| i as usize) {
        Some(idx) => {
            let Some(stream) = idx.checked_sub(1).and_then(|i| streams.get(i)) else {
                bail!("stream with index {} doesn't exist", idx);
            };
            dump_one(meta, &options, stream, output)?;
            Ok(0)
        }
        None => {
            let jobs = args
                .get_one::<u64>("jobs")
                .map_or_else(default_jobs, |&j| j as usize);
            match dump_all(meta, &options, &streams, output, jobs) {
                0 => Ok(0),
                _ => Ok(1),
            }
        }
    }
}
