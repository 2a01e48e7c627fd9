use std::io::{IsTerminal, Write};

use camlink_flasher::{camlink, operation::OperationEvent, transport::DeviceSummary};

use crate::output::{format_device_line, percent_done, Event, OutputOptions, Reporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Quiet,
    Verbose,
    Progress,
}

pub struct HumanOutput {
    opts: OutputOptions,
    is_tty: bool,
    progress_active: bool,
    last_percent: Option<u64>,
}

impl HumanOutput {
    pub fn new(opts: OutputOptions) -> Self {
        Self {
            opts,
            is_tty: std::io::stderr().is_terminal(),
            progress_active: false,
            last_percent: None,
        }
    }

    fn mode(&self) -> Mode {
        if self.opts.quiet {
            Mode::Quiet
        } else if self.opts.verbose {
            Mode::Verbose
        } else {
            Mode::Progress
        }
    }

    fn finish_line(&mut self) {
        if self.progress_active {
            eprintln!();
            self.progress_active = false;
        }
    }

    fn println(&mut self, msg: &str) {
        if self.mode() == Mode::Quiet {
            return;
        }
        self.finish_line();
        eprintln!("{msg}");
    }

    fn progress_update(&mut self, label: &str, addr: u32, start: u32, length: u64) {
        let percent = percent_done(addr, start, length);

        if self.mode() == Mode::Verbose {
            self.println(&format!("{label} @ 0x{addr:06X} ({percent:3}%)"));
            return;
        }
        if self.mode() != Mode::Progress {
            return;
        }

        if self.is_tty {
            eprint!("\r  {label} {percent:3}% @ 0x{addr:06X}");
            let _ = std::io::stderr().flush();
            self.progress_active = true;
            self.last_percent = Some(percent);
            return;
        }

        let last = self.last_percent.unwrap_or(0);
        if percent == 0 || percent == 100 || percent >= last + 10 {
            self.last_percent = Some(percent);
            self.println(&format!("  {label} {percent:3}%"));
        }
    }

    fn on_operation_event(&mut self, ev: OperationEvent) {
        match ev {
            OperationEvent::DumpStart { start, length } => {
                self.last_percent = None;
                self.println(&format!("dump: {length} bytes from 0x{start:06X}"));
            }
            OperationEvent::ChunkRead {
                addr,
                start,
                length,
            } => {
                self.progress_update("reading", addr, start, length);
            }
            OperationEvent::EraseStart { start, length } => {
                self.last_percent = None;
                self.println(&format!("erase: {length} bytes from 0x{start:06X}"));
            }
            OperationEvent::SectorErased {
                addr,
                start,
                length,
            } => {
                self.progress_update("erasing", addr, start, length);
            }
            OperationEvent::ProgramStart { start, length } => {
                self.last_percent = None;
                self.finish_line();
                self.println(&format!("program: {length} bytes at 0x{start:06X}"));
            }
            OperationEvent::ChunkWritten {
                addr,
                start,
                length,
            } => {
                self.progress_update("programming", addr, start, length);
            }
            OperationEvent::BootMagicCleared => {
                self.println("boot magic cleared; device falls back to the vendor bootloader");
            }
        }
    }
}

impl Reporter for HumanOutput {
    fn emit(&mut self, event: Event) {
        match event {
            Event::Operation(ev) => self.on_operation_event(ev),
            Event::ListDevices(devices) => emit_list_devices(&devices, self),
            Event::Error { code: _, message } => {
                self.finish_line();
                eprintln!("error: {message}");
            }
        }
    }

    fn finish(&mut self) {
        self.finish_line();
    }
}

fn emit_list_devices(devices: &[DeviceSummary], out: &mut HumanOutput) {
    if devices.is_empty() {
        out.println(&format!(
            "No Cam Link devices found (VID:PID {:04X}:{:04X})",
            camlink::VID,
            camlink::PID
        ));
        return;
    }

    for (i, d) in devices.iter().enumerate() {
        out.println(&format_device_line(i, d));
    }
}
