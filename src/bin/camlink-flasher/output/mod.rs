use camlink_flasher::{operation::OperationEvent, transport::DeviceSummary};

use crate::cli;

pub mod human;
pub mod json;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub verbose: bool,
    pub quiet: bool,
    pub json_timestamps: bool,
    pub json_progress: JsonProgressMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonProgressMode {
    Blocks,
    Percent,
    None,
}

#[derive(Debug, Clone)]
pub enum Event {
    Operation(OperationEvent),
    ListDevices(Vec<DeviceSummary>),
    Error { code: i32, message: String },
}

pub trait Reporter {
    fn emit(&mut self, event: Event);
    fn finish(&mut self);
}

pub fn make(args: &cli::OutputArgs) -> Box<dyn Reporter> {
    let json_progress = match args.json_progress {
        cli::JsonProgressArg::Blocks => JsonProgressMode::Blocks,
        cli::JsonProgressArg::Percent => JsonProgressMode::Percent,
        cli::JsonProgressArg::None => JsonProgressMode::None,
    };
    let opts = OutputOptions {
        verbose: args.verbose,
        quiet: args.quiet,
        json_timestamps: args.json_timestamps,
        json_progress,
    };
    if args.json {
        Box::new(json::JsonOutput::new(opts))
    } else {
        Box::new(human::HumanOutput::new(opts))
    }
}

pub fn make_for_list(args: &cli::ListArgs) -> Box<dyn Reporter> {
    let opts = OutputOptions {
        verbose: false,
        quiet: false,
        json_timestamps: false,
        json_progress: JsonProgressMode::Blocks,
    };
    if args.json {
        Box::new(json::JsonOutput::new(opts))
    } else {
        Box::new(human::HumanOutput::new(opts))
    }
}

/// Percentage of the operation's range covered once `addr` is reached.
pub fn percent_done(addr: u32, start: u32, length: u64) -> u64 {
    let done = u64::from(addr.saturating_sub(start));
    done.saturating_mul(100)
        .saturating_div(length.max(1))
        .min(100)
}

pub fn format_device_line(index: usize, d: &DeviceSummary) -> String {
    format!(
        "[{index}] camlink {:04X}:{:04X} bus {} addr {}",
        d.vid, d.pid, d.bus, d.address
    )
}

pub fn device_to_value(index: usize, d: &DeviceSummary) -> serde_json::Value {
    let mut v = serde_json::to_value(d)
        .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
    if let serde_json::Value::Object(obj) = &mut v {
        obj.insert("index".to_string(), serde_json::Value::from(index as u64));
    }
    v
}
