use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{error, LevelFilter};

mod codecs;
mod dump;
mod options;

fn cli() -> Command {
    let input = Arg::new("INPUT")
        .help("The rtpdump capture file")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .index(1);

    Command::new("rtpdump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract RTP voice payloads from rtpdump captures into playable files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log per packet decisions, RUST_LOG takes precedence"),
        )
        .subcommand(
            Command::new("streams")
                .visible_alias("s")
                .about("Display RTP streams in the capture")
                .arg(input.clone()),
        )
        .subcommand(
            Command::new("dump")
                .visible_alias("d")
                .about("Dump RTP payload to file")
                .arg(input)
                .arg(
                    Arg::new("codec")
                        .long("codec")
                        .short('c')
                        .value_name("CODEC")
                        .default_value("amr")
                        .help("Codec to use for stream decoding"),
                )
                .arg(
                    Arg::new("flags")
                        .long("flags")
                        .short('f')
                        .value_name("FLAGS")
                        .help("Codec options in \"option:value\" format, separated by comma"),
                )
                .arg(
                    Arg::new("options-file")
                        .long("options-file")
                        .short('F')
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .help("YAML mapping of codec options, --flags take precedence"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("FILE")
                        .default_value("out.amr")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file, base name of the output files when dumping all streams"),
                )
                .arg(
                    Arg::new("stream")
                        .long("stream")
                        .short('s')
                        .value_name("INDEX")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Stream index to dump as listed by \"streams\", all streams by default"),
                )
                .arg(
                    Arg::new("jobs")
                        .long("jobs")
                        .short('j')
                        .value_name("N")
                        .value_parser(value_parser!(u64).range(1..))
                        .conflicts_with("stream")
                        .help("Streams dumped in parallel, number of CPUs by default"),
                ),
        )
        .subcommand(
            Command::new("codecs")
                .visible_alias("c")
                .about("List supported codecs and their options")
                .subcommand_required(true)
                .subcommand(
                    Command::new("list").arg(
                        Arg::new("NAME").help("Codec name, all codecs when omitted").index(1),
                    ),
                ),
        )
}

fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn main() {
    let args = cli().get_matches();
    init_logger(args.get_flag("verbose"));

    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            1
        }
    };

    std::process::exit(code)
}

fn run(args: &ArgMatches) -> Result<i32> {
    match args.subcommand() {
        Some(("streams", args)) => streams(args),
        Some(("dump", args)) => dump::run(args),
        Some(("codecs", args)) => match args.subcommand() {
            Some(("list", args)) => codecs::list(args),
            _ => bail!("unknown codecs command"),
        },
        _ => bail!("unknown command"),
    }
}

fn streams(args: &ArgMatches) -> Result<i32> {
    let input = args.get_one::<PathBuf>("INPUT").context("missing input file")?;
    let mut reader = rtpdump_format::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;

    let streams = reader.read_streams()?;
    if streams.is_empty() {
        println!("No streams found");
        return Ok(0);
    }

    for (idx, stream) in streams.iter().enumerate() {
        println!("{:>3}  {}", idx + 1, stream);
    }
    Ok(0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cli() {
        cli().debug_assert();
    }

    #[test]
    fn test_dump_args() {
        let args = cli()
            .try_get_matches_from(["rtpdump", "-v", "dump", "call.rtpdump", "-f", "sample-rate:nb", "-s", "2"])
            .unwrap();
        assert!(args.get_flag("verbose"));
        let (name, dump) = args.subcommand().unwrap();
        assert_eq!(name, "dump");
        assert_eq!(dump.get_one::<String>("codec").unwrap(), "amr");
        assert_eq!(dump.get_one::<u64>("stream"), Some(&2));
        assert_eq!(dump.get_one::<PathBuf>("output").unwrap(), &PathBuf::from("out.amr"));

        assert!(cli()
            .try_get_matches_from(["rtpdump", "dump", "call.rtpdump", "-s", "0"])
            .is_err());

        let args = cli().try_get_matches_from(["rtpdump", "dump", "call.rtpdump", "-j", "2"]).unwrap();
        let (_, dump) = args.subcommand().unwrap();
        assert_eq!(dump.get_one::<u64>("jobs"), Some(&2));
        assert!(cli()
            .try_get_matches_from(["rtpdump", "dump", "call.rtpdump", "-j", "0"])
            .is_err());
    }
}
