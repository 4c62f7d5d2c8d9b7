use std::path::PathBuf;
use std::process::exit;

use clap::{Arg, Command, value_parser};
use fifo_fetch::devmem::DevMem;
use fifo_fetch::fifo::regs;

fn parse_word(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| e.to_string())
}

fn main() {
    env_logger::init();

    let matches = Command::new("regmon")
        .about("Peek or poke a 32-bit word in the FIFO register window")
        .arg(
            Arg::new("offset")
                .value_parser(parse_word)
                .required(true)
                .help("Byte offset inside the register window (hex with 0x prefix)"),
        )
        .arg(
            Arg::new("value")
                .value_parser(parse_word)
                .help("Word to write; omit to read"),
        )
        .arg(
            Arg::new("device")
                .long("device")
                .value_parser(value_parser!(PathBuf))
                .default_value("/dev/mem")
                .help("Memory device exposing the register window"),
        )
        .get_matches();

    let offset = *matches.get_one::<u32>("offset").unwrap() as usize;
    if offset % 4 != 0 || offset + 4 > regs::MAP_SIZE {
        eprintln!("regmon: offset {offset:#x} is not a word inside the register window");
        exit(2);
    }

    let device = matches.get_one::<PathBuf>("device").unwrap();
    let mem = match DevMem::open(device, regs::PHYS_BASE, regs::MAP_SIZE) {
        Ok(mem) => mem,
        Err(e) => {
            eprintln!("regmon: {e}");
            exit(1);
        }
    };

    match matches.get_one::<u32>("value") {
        Some(&value) => mem.write32(offset, value),
        None => println!("{:08x}", mem.read32(offset)),
    }
}
