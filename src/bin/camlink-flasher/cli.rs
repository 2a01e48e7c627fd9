use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum JsonProgressArg {
    /// Emit a JSON event for every transferred chunk.
    Blocks,
    /// Emit fewer JSON events by throttling chunk output to percent changes.
    Percent,
    /// Do not emit per-chunk progress events.
    None,
}

#[derive(Parser)]
#[command(name = "camlink-flasher")]
#[command(about = "Cam Link 4K SPI flash utility")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Dump SPI flash to a raw binary file.
    Dump(DumpArgs),

    /// Erase, then program SPI flash from a raw binary file.
    Program(ProgramArgs),

    /// Erase a flash range (one 64 KiB sector by default).
    Erase(EraseArgs),

    /// Clear the boot magic so the device boots into the vendor bootloader.
    Bootloader(BootloaderArgs),

    /// List connected Cam Link devices.
    List(ListArgs),
}

#[derive(Parser, Clone)]
pub struct DeviceArgs {
    /// Wait for the device to appear.
    #[arg(long)]
    pub wait: bool,

    /// Max time to wait for the device (0 = forever).
    #[arg(long, default_value_t = 0)]
    pub wait_timeout_ms: u64,

    /// Max time to poll the flash busy flag after a write/erase (0 = forever).
    #[arg(long, default_value_t = 0)]
    pub busy_timeout_ms: u64,
}

#[derive(Parser, Clone)]
pub struct OutputArgs {
    /// Emit JSON line events to stdout.
    #[arg(long)]
    pub json: bool,

    /// Include monotonic timestamps in JSON events (milliseconds since process start).
    #[arg(long, requires = "json")]
    pub json_timestamps: bool,

    /// JSON progress verbosity.
    ///
    /// - blocks: emit every chunk (most verbose)
    /// - percent: emit fewer progress events
    /// - none: no per-chunk progress events
    #[arg(long, value_enum, default_value_t = JsonProgressArg::Percent, requires = "json")]
    pub json_progress: JsonProgressArg,

    /// Reduce output (only errors).
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// More logs to stderr.
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Parser)]
pub struct DumpArgs {
    /// Output file for the raw dump.
    pub out: PathBuf,

    /// Flash start address.
    #[arg(long, default_value_t = 0)]
    pub start: u32,

    /// Bytes to read (default: the full 4 MiB part).
    #[arg(long)]
    pub length: Option<u64>,

    #[command(flatten)]
    pub device: DeviceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser)]
pub struct ProgramArgs {
    /// Raw binary image to program.
    pub image: PathBuf,

    /// Flash start address.
    #[arg(long, default_value_t = 0)]
    pub start: u32,

    /// Bytes to program (default: from start to the end of the part).
    #[arg(long)]
    pub length: Option<u64>,

    #[command(flatten)]
    pub device: DeviceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser)]
pub struct EraseArgs {
    /// Flash start address.
    #[arg(long, default_value_t = 0)]
    pub start: u32,

    /// Bytes to erase, rounded up to whole 64 KiB sectors (default: one sector).
    #[arg(long)]
    pub length: Option<u64>,

    #[command(flatten)]
    pub device: DeviceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser)]
pub struct BootloaderArgs {
    #[command(flatten)]
    pub device: DeviceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Emit JSON line output.
    #[arg(long)]
    pub json: bool,
}
