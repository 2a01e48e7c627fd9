use std::collections::BTreeMap;
use std::time::Instant;

use camlink_flasher::{operation::OperationEvent, transport::DeviceSummary};

use crate::output::{
    device_to_value, percent_done, Event, JsonProgressMode, OutputOptions, Reporter,
};

#[derive(serde::Serialize)]
pub struct JsonEvent {
    schema: u32,
    event: &'static str,
    #[serde(flatten)]
    fields: BTreeMap<&'static str, serde_json::Value>,
}

impl JsonEvent {
    pub fn status(event: &'static str) -> Self {
        Self {
            schema: 1,
            event,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_u64(mut self, k: &'static str, v: u64) -> Self {
        self.fields.insert(k, serde_json::Value::from(v));
        self
    }

    pub fn with_str(mut self, k: &'static str, v: &str) -> Self {
        self.fields.insert(k, serde_json::Value::from(v));
        self
    }

    pub fn with_value(mut self, k: &'static str, v: serde_json::Value) -> Self {
        self.fields.insert(k, v);
        self
    }
}

pub struct JsonOutput {
    opts: OutputOptions,
    start: Instant,
    last_percent: Option<u64>,
}

impl JsonOutput {
    pub fn new(opts: OutputOptions) -> Self {
        Self {
            opts,
            start: Instant::now(),
            last_percent: None,
        }
    }

    pub(crate) fn render_event_json(&mut self, ev: JsonEvent) -> String {
        let mut ev = ev;
        if self.opts.json_timestamps {
            ev.fields.insert(
                "t_ms",
                serde_json::Value::from(self.start.elapsed().as_millis() as u64),
            );
        }
        serde_json::to_string(&ev).unwrap_or_else(|_| "{}".to_string())
    }

    fn json_event(&mut self, ev: JsonEvent) {
        println!("{}", self.render_event_json(ev));
    }

    fn error_event(&mut self, code: i32, msg: &str) {
        self.json_event(
            JsonEvent::status("error")
                .with_u64("code", code as u64)
                .with_str("message", msg),
        );

        if self.opts.verbose {
            eprintln!("error: {msg}");
        }
    }

    fn emit_operation(&mut self, ev: OperationEvent) {
        match &ev {
            OperationEvent::DumpStart { .. }
            | OperationEvent::EraseStart { .. }
            | OperationEvent::ProgramStart { .. } => {
                self.last_percent = None;
            }
            OperationEvent::ChunkRead {
                addr,
                start,
                length,
            }
            | OperationEvent::SectorErased {
                addr,
                start,
                length,
            }
            | OperationEvent::ChunkWritten {
                addr,
                start,
                length,
            } => match self.opts.json_progress {
                JsonProgressMode::Blocks => {}
                JsonProgressMode::None => return,
                JsonProgressMode::Percent => {
                    let percent = percent_done(*addr, *start, *length);
                    let should_emit = percent == 100
                        || self.last_percent.map(|p| p != percent).unwrap_or(true);
                    if !should_emit {
                        return;
                    }
                    self.last_percent = Some(percent);
                }
            },
            OperationEvent::BootMagicCleared => {}
        }

        self.json_event(operation_event_to_json(ev));
    }
}

impl Reporter for JsonOutput {
    fn emit(&mut self, event: Event) {
        match event {
            Event::Operation(ev) => self.emit_operation(ev),
            Event::ListDevices(devices) => self.json_event(list_to_json(&devices)),
            Event::Error { code, message } => self.error_event(code, &message),
        }
    }

    fn finish(&mut self) {}
}

pub fn list_to_json(devices: &[DeviceSummary]) -> JsonEvent {
    JsonEvent::status("list")
        .with_u64("count", devices.len() as u64)
        .with_value(
            "devices",
            serde_json::Value::Array(
                devices
                    .iter()
                    .enumerate()
                    .map(|(i, d)| device_to_value(i, d))
                    .collect(),
            ),
        )
}

pub fn operation_event_to_json(ev: OperationEvent) -> JsonEvent {
    match ev {
        OperationEvent::DumpStart { start, length } => JsonEvent::status("dump_start")
            .with_u64("start", u64::from(start))
            .with_u64("length", length),
        OperationEvent::ChunkRead {
            addr,
            start,
            length,
        } => JsonEvent::status("chunk_read")
            .with_u64("addr", u64::from(addr))
            .with_u64("percent", percent_done(addr, start, length)),
        OperationEvent::EraseStart { start, length } => JsonEvent::status("erase_start")
            .with_u64("start", u64::from(start))
            .with_u64("length", length),
        OperationEvent::SectorErased {
            addr,
            start,
            length,
        } => JsonEvent::status("sector_erased")
            .with_u64("addr", u64::from(addr))
            .with_u64("percent", percent_done(addr, start, length)),
        OperationEvent::ProgramStart { start, length } => JsonEvent::status("program_start")
            .with_u64("start", u64::from(start))
            .with_u64("length", length),
        OperationEvent::ChunkWritten {
            addr,
            start,
            length,
        } => JsonEvent::status("chunk_written")
            .with_u64("addr", u64::from(addr))
            .with_u64("percent", percent_done(addr, start, length)),
        OperationEvent::BootMagicCleared => JsonEvent::status("boot_magic_cleared"),
    }
}
