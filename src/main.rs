use std::path::PathBuf;
use std::process::exit;

use clap::{Arg, ArgAction, Command, value_parser};
use fifo_fetch::config::{CaptureConfig, SinkMode};
use fifo_fetch::fifo;

fn main() {
    let matches = Command::new("fifo-fetch")
        .about("Drain the memory-mapped AXI FIFO into the console or a file")
        .arg(
            Arg::new("samples")
                .short('n')
                .long("samples")
                .value_parser(value_parser!(u64).range(1..))
                .required(true)
                .help("Number of samples to drain from the FIFO"),
        )
        .arg(
            Arg::new("mode")
                .short('t')
                .long("mode")
                .default_value("buffer")
                .value_parser(["console", "buffer", "stream"])
                .help("Where captured samples go"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .default_value("SavedData.bin")
                .help("Output file for the file modes"),
        )
        .arg(
            Arg::new("device")
                .long("device")
                .value_parser(value_parser!(PathBuf))
                .default_value("/dev/mem")
                .help("Memory device exposing the register window"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Report drain timing and enable verbose logging"),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if debug { "debug" } else { "error" }),
    )
    .init();

    let mode = match matches.get_one::<String>("mode").unwrap().as_str() {
        "console" => SinkMode::Console,
        "stream" => SinkMode::StreamedFile,
        _ => SinkMode::BufferedFile,
    };
    let cfg = CaptureConfig {
        samples: *matches.get_one::<u64>("samples").unwrap() as usize,
        mode,
        debug,
        device: matches.get_one::<PathBuf>("device").unwrap().clone(),
        output: matches.get_one::<PathBuf>("output").unwrap().clone(),
    };

    match fifo::run(&cfg) {
        Ok(Some(timing)) => eprintln!("{timing}"),
        Ok(None) => {}
        Err(e) => {
            eprintln!("fifo-fetch: {e}");
            exit(1);
        }
    }
}
