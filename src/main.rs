//! Headless Vector-06C runner
//!
//! Boots a program, runs it for a number of frames and optionally saves
//! the last frame and dumps the registers.

use clap::{App, Arg};
use devector::frontend;
use devector::hardware::{ExecSpeed, Hardware, HardwareConfig, Request, Response};
use devector::loader;
use devector::memory::{GlobalAddr, ROM_LOAD_ADDR};
use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

fn parse_speed(value: &str) -> Option<ExecSpeed> {
    match value {
        "1" => Some(ExecSpeed::Percent1),
        "20" => Some(ExecSpeed::Percent20),
        "50" => Some(ExecSpeed::Percent50),
        "100" => Some(ExecSpeed::Percent100),
        "200" => Some(ExecSpeed::Percent200),
        "max" => Some(ExecSpeed::Max),
        _ => None,
    }
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = App::new("devector")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Cycle-accurate Vector-06C emulator, headless runner")
        .arg(
            Arg::with_name("rom")
                .value_name("ROM")
                .help("Program to load at 0x100 (.rom or .zip)")
                .index(1),
        )
        .arg(
            Arg::with_name("boot")
                .long("boot")
                .value_name("boot.rom")
                .takes_value(true)
                .help("Boot ROM image"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("devector.json")
                .takes_value(true)
                .help("Hardware configuration file"),
        )
        .arg(
            Arg::with_name("frames")
                .long("frames")
                .short("n")
                .value_name("N")
                .takes_value(true)
                .default_value("50")
                .help("Frames to run"),
        )
        .arg(
            Arg::with_name("speed")
                .long("speed")
                .value_name("PERCENT")
                .takes_value(true)
                .possible_values(&["1", "20", "50", "100", "200", "max"])
                .help("Run paced in real time at this speed instead of as fast as possible"),
        )
        .arg(
            Arg::with_name("screenshot")
                .long("screenshot")
                .value_name("frame.png")
                .takes_value(true)
                .min_values(0)
                .help("Save the last complete frame as PNG"),
        )
        .arg(
            Arg::with_name("regs")
                .long("regs")
                .help("Print the CPU registers when done"),
        )
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => HardwareConfig::from_file(path)?,
        None => HardwareConfig::default(),
    };
    if let Some(boot) = matches.value_of("boot") {
        config.boot_rom = Some(PathBuf::from(boot));
    }
    config.start_running = false;

    let frames: u64 = matches.value_of("frames").unwrap_or("50").parse()?;
    let speed = matches.value_of("speed").and_then(parse_speed);

    let hardware = Hardware::new(&config)?;

    if let Some(path) = matches.value_of("rom") {
        let data = loader::read_file(path)?;
        hardware.request(Request::Reset)?;
        hardware.request(Request::Restart)?;
        let resp = hardware.request(Request::LoadRom {
            addr: ROM_LOAD_ADDR as GlobalAddr,
            data,
        })?;
        if let Response::Loaded(Err(e)) = resp {
            return Err(e.into());
        }
        log::info!("{} loaded", path);
    }

    match speed {
        Some(speed) => run_paced(&hardware, speed, frames)?,
        None => {
            for _ in 0..frames {
                hardware.request(Request::ExecuteFrameNoBreaks)?;
            }
        }
    }

    if matches.is_present("screenshot") {
        let path = match matches.value_of("screenshot") {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(frontend::screenshot_name(chrono::Local::now())),
        };
        let frame = hardware.get_frame(true)?;
        frontend::save_png(&frame, &path)?;
        println!("frame saved to {}", path.display());
    }

    if matches.is_present("regs") {
        if let Response::Regs { regs, m } = hardware.request(Request::GetRegs)? {
            println!(
                "PC={:04X} SP={:04X} AF={:04X} BC={:04X} DE={:04X} HL={:04X} M={:02X} CC={}",
                regs.pc, regs.sp, regs.af, regs.bc, regs.de, regs.hl, m, regs.cc
            );
        }
    }

    Ok(())
}

/// Let the machine run on its own until `frames` more frames are done
fn run_paced(hardware: &Hardware, speed: ExecSpeed, frames: u64) -> Result<(), Box<dyn Error>> {
    let start = frame_num(hardware)?;
    hardware.request(Request::SetCpuSpeed { speed })?;
    hardware.request(Request::Run)?;
    while frame_num(hardware)? < start + frames {
        thread::sleep(Duration::from_millis(10));
    }
    hardware.request(Request::Stop)?;
    Ok(())
}

fn frame_num(hardware: &Hardware) -> Result<u64, Box<dyn Error>> {
    match hardware.request(Request::GetRasterPos)? {
        Response::RasterPos { frame_num, .. } => Ok(frame_num),
        other => Err(format!("unexpected response {:?}", other).into()),
    }
}
