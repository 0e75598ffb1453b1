use std::env;
use std::process;

use ios::{Endian, IosFlags, Registry};

struct Args {
    handler: String,
    offset: i64,
    bits: u32,
    write_value: Option<u64>,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut handler = None;
    let mut offset = 0i64;
    let mut bits = 32u32;
    let mut write_value = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--offset" => {
                i += 1;
                offset = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(offset);
            }
            "--bits" => {
                i += 1;
                bits = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(bits);
            }
            "--write" => {
                i += 1;
                write_value = args.get(i).and_then(|s| parse_u64(s));
            }
            _ if !args[i].starts_with('-') && handler.is_none() => {
                handler = Some(args[i].clone());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                usage_and_exit();
            }
        }
        i += 1;
    }
    let handler = handler.unwrap_or_else(|| usage_and_exit());
    Args { handler, offset, bits, write_value }
}

fn parse_u64(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn usage_and_exit() -> ! {
    eprintln!("Usage: peek [--offset BITS] [--bits N] [--write VALUE] <handler>");
    eprintln!("  handler: *tag* (memory), a file path, or nbd://host/export");
    process::exit(1);
}

fn main() {
    env_logger::init();
    let args = parse_args();

    let mut reg = Registry::new();
    let flags = IosFlags::new(flags_bits());
    let id = reg.open(&args.handler, flags, true).unwrap_or_else(|e| {
        eprintln!("Failed to open {}: {e}", args.handler);
        process::exit(1);
    });

    if let Some(value) = args.write_value {
        reg.write_uint(id, args.offset, args.bits, Endian::Msb, value)
            .unwrap_or_else(|e| {
                eprintln!("write failed: {e}");
                process::exit(1);
            });
        println!(
            "wrote {value:#x} ({} bits) at bit offset {} of {}",
            args.bits, args.offset, args.handler
        );
    }

    let value = reg
        .read_uint(id, args.offset, args.bits, Endian::Msb)
        .unwrap_or_else(|e| {
            eprintln!("read failed: {e}");
            process::exit(1);
        });
    println!(
        "{}: {} bits at bit offset {} = {value:#x} ({value})",
        args.handler, args.bits, args.offset
    );
}

/// `READ|WRITE|CREATE|TRUNCATE` is one of the file backend's four accepted
/// mode combinations (spec.md §4.1); the memory backend ignores the mode
/// entirely, so this works for both a `*tag*` handler and a file path,
/// creating the file fresh if it doesn't already exist.
fn flags_bits() -> u64 {
    ios::flags::IOS_F_READ
        | ios::flags::IOS_F_WRITE
        | ios::flags::IOS_F_CREATE
        | ios::flags::IOS_F_TRUNCATE
}
