use std::time::Duration;

use camlink_flasher::api;

use crate::cli;
use crate::exit_codes;
use crate::output::{Event, Reporter};

pub mod bootloader;
pub mod dump;
pub mod erase;
pub mod list;
pub mod program;

pub(crate) fn device_options(args: &cli::DeviceArgs) -> api::DeviceOptions {
    let ms = |v: u64| {
        if v == 0 {
            None
        } else {
            Some(Duration::from_millis(v))
        }
    };
    api::DeviceOptions {
        wait: args.wait,
        wait_timeout: ms(args.wait_timeout_ms),
        busy_timeout: ms(args.busy_timeout_ms),
    }
}

pub(crate) fn report_error(out: &mut dyn Reporter, e: &api::TaskError) -> i32 {
    let code = match e.kind() {
        api::TaskErrorKind::NoDevice => exit_codes::EXIT_NO_DEVICE,
        api::TaskErrorKind::UnexpectedFirmware => exit_codes::EXIT_UNEXPECTED_FIRMWARE,
        api::TaskErrorKind::Transport => exit_codes::EXIT_TRANSPORT,
        api::TaskErrorKind::FlashTimeout => exit_codes::EXIT_FLASH_TIMEOUT,
        api::TaskErrorKind::Io => exit_codes::EXIT_IO,
    };
    out.emit(Event::Error {
        code,
        message: e.to_string(),
    });
    code
}
