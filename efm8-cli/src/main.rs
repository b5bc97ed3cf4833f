use colored::*;
use efm8::hex::{read_hex_file, write_hex_file};
use efm8::{flash_device, read_device, to_frames, u2fzero, FrameOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use structopt::StructOpt;

fn main() {
    // Initialize the logging backend.
    pretty_env_logger::init();

    let args = Opt::from_args();

    // Start timer.
    let instant = Instant::now();

    if let Err(e) = run(&args) {
        eprintln!("    {} {}", "Error".red().bold(), e);
        std::process::exit(1);
    }

    // Stop timer.
    let elapsed = instant.elapsed();
    println!(
        "    {} in {}s",
        "Finished".green().bold(),
        elapsed.as_millis() as f32 / 1000.0
    );
}

fn run(args: &Opt) -> Result<(), efm8::Error> {
    let serial = args.serial.as_deref();

    match &args.cmd {
        Cmd::flash {
            file,
            no_verify,
            no_run,
        } => flash(file, args.vid, args.pid, serial, !*no_verify, !*no_run),
        Cmd::read { file, length } => {
            println!(
                "    {} {} bytes from HID:{:X}:{:X}",
                "Reading".green().bold(),
                length,
                args.vid,
                args.pid
            );

            let buf = read_device(args.vid, args.pid, serial, *length)?;
            write_hex_file(file, &buf)?;

            println!("    {} {:?}", "Wrote".green().bold(), file);
            Ok(())
        }
        Cmd::u2fzero { file } => {
            // maybe we already were in the bootloader
            if let Err(e) = u2fzero::reset(serial) {
                log::debug!("jump to bootloader failed: {}", e);
            } else {
                // give the host time to see the device change
                std::thread::sleep(Duration::from_secs(1));
            }

            flash(file, args.vid, args.pid, serial, true, true)
        }
    }
}

fn flash(
    file: &Path,
    vid: u16,
    pid: u16,
    serial: Option<&str>,
    verify: bool,
    run: bool,
) -> Result<(), efm8::Error> {
    let image = read_hex_file(file)?;
    let frames = to_frames(&image, FrameOptions { verify, run })?;

    println!(
        "    {} {:?}, {} bytes in {} frames",
        "Flashing".green().bold(),
        file,
        image.len(),
        frames.len()
    );

    flash_device(vid, pid, serial, &frames)
}

fn parse_hex_16(input: &str) -> Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(input.trim_start_matches("0x"), 16)
}

fn parse_hex_usize(input: &str) -> Result<usize, std::num::ParseIntError> {
    usize::from_str_radix(input.trim_start_matches("0x"), 16)
}

#[allow(non_camel_case_types)]
#[derive(StructOpt, Debug, PartialEq)]
pub enum Cmd {
    /// flash an Intel HEX file, note includes a verify and run
    flash {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
        /// skip the VERIFY before byte 0 is committed
        #[structopt(long = "no-verify")]
        no_verify: bool,
        /// stay in the bootloader once flashed
        #[structopt(long = "no-run")]
        no_run: bool,
    },

    /// read flash back into an Intel HEX file by brute forcing the VERIFY checksum, slow
    read {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
        /// bytes to read, hex
        #[structopt(short = "l", long = "length", default_value = "0x4000", parse(try_from_str = parse_hex_usize))]
        length: usize,
    },

    /// jump a U2F-Zero into its bootloader, then flash
    u2fzero {
        #[structopt(parse(from_os_str))]
        file: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(name = "efm8", about = "Flash via AN945: EFM8 Factory Bootloader HID")]
struct Opt {
    #[structopt(subcommand)]
    cmd: Cmd,

    /// USB Vendor ID of device to program
    #[structopt(short = "v", name = "vid", long = "vid", default_value = "10C4", parse(try_from_str = parse_hex_16))]
    vid: u16,
    /// USB Product ID of device to program
    #[structopt(short = "p", name = "pid", long = "pid", default_value = "EAC9", parse(try_from_str = parse_hex_16))]
    pid: u16,
    /// Serial number of device to program
    #[structopt(short = "s", name = "serial", long = "serial")]
    serial: Option<String>,
}
