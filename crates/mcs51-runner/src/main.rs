use std::fs;
use std::path::PathBuf;

use mcs51::sfr::{PSW_AC, PSW_C, PSW_OV, PSW_P};
use mcs51::{DEFAULT_FORMAT, ErrorKind, Mcu, Space, Variant, disasm};

use clap::{Parser, ValueEnum};
use tracing::info;

#[derive(Parser)]
#[command(about = "Run a raw MCS-51 ROM image in the instruction-level simulator")]
struct Args {
    /// ROM image to load (raw binary)
    #[arg(value_name = "ROM_FILE")]
    rom_file: PathBuf,

    /// Microcontroller variant to emulate
    #[arg(short = 'c', long, value_enum, default_value = "8052")]
    variant: VariantArg,

    /// Load the image into external instead of internal code memory
    #[arg(long)]
    external: bool,

    /// Maximum number of instructions to execute
    #[arg(short, long, default_value_t = 100_000)]
    max_instructions: u64,

    /// Oscillator frequency in Hz
    #[arg(long)]
    oscillator: Option<u32>,

    /// Print each instruction before executing it
    #[arg(short, long)]
    trace: bool,

    /// Line format for the trace disassembly
    #[arg(short, long)]
    format: Option<String>,

    /// Stop the run when a recoverable simulator error is latched
    #[arg(long)]
    pause_on_error: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    #[value(name = "8031")]
    V8031,
    #[value(name = "8051")]
    V8051,
    #[value(name = "8052")]
    V8052,
    #[value(name = "8032")]
    V8032,
    #[value(name = "89s51")]
    V89S51,
    #[value(name = "89s52")]
    V89S52,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::V8031 => Variant::M8031,
            VariantArg::V8051 => Variant::M8051,
            VariantArg::V8052 => Variant::M8052,
            VariantArg::V8032 => Variant::M8032,
            VariantArg::V89S51 => Variant::M89S51,
            VariantArg::V89S52 => Variant::M89S52,
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut mcu = Mcu::new(args.variant.into());
    if let Some(hz) = args.oscillator {
        mcu.set_oscillator_hz(hz);
    }

    let image = fs::read(&args.rom_file).unwrap();
    let space = if args.external {
        Space::Xrom
    } else {
        Space::Irom
    };
    let highest = mcu.memory_mut().load(space, 0, &image);
    info!(
        "loaded {} bytes into {:?}, highest address {:04X}",
        image.len(),
        space,
        highest
    );

    let format = args.format.as_deref().unwrap_or(DEFAULT_FORMAT);

    let mut serial = Vec::new();
    let mut stop_reason = "instruction limit reached";
    while mcu.instructions() < args.max_instructions {
        if args.trace {
            let (text, _) = disasm::line(&mcu, mcu.pc, format);
            print!("{text}");
        }
        let step = mcu.step(None);
        if let Some(byte) = step.output {
            serial.push(byte);
        }
        if step.halted {
            stop_reason = "breakpoint";
            break;
        }
        if args.pause_on_error && mcu.last_error() != ErrorKind::NoError {
            stop_reason = mcu.last_error().message().unwrap_or("error");
            break;
        }
    }

    println!(
        "CPU stopped at 0x{:04X} after {} instructions ({} cycles, {:.6} s): {}",
        mcu.pc,
        mcu.instructions(),
        mcu.cycles(),
        mcu.run_time(),
        stop_reason
    );

    println!(
        "  A={:02X}  B={:02X}  DPTR={:04X}  SP={:02X}  C={} OV={} AC={} P={}",
        mcu.acc(),
        mcu.b(),
        mcu.dptr(),
        mcu.sp(),
        mcu.flag(PSW_C) as u8,
        mcu.flag(PSW_OV) as u8,
        mcu.flag(PSW_AC) as u8,
        mcu.flag(PSW_P) as u8,
    );
    print!("  ");
    for i in 0..8 {
        print!("R{}={:02X} ", i, mcu.r(i));
    }
    println!();

    let stats = mcu.stats();
    println!("  max SP: {:02X}", mcu.max_sp());
    if let (Some(min), Some(max)) = (stats.min_idata, stats.max_idata) {
        println!("  IDATA touched: {min:02X}-{max:02X}");
    }
    if let (Some(min), Some(max)) = (stats.min_xdata, stats.max_xdata) {
        println!("  XDATA touched: {min:04X}-{max:04X}");
    }
    println!(
        "  highest code addresses: irom {:04X}, xrom {:04X}",
        stats.max_irom, stats.max_xrom
    );

    if !serial.is_empty() {
        println!("UART output: {}", String::from_utf8_lossy(&serial));
    }
}
