use camlink_flasher::api;

use crate::cli;
use crate::exit_codes;
use crate::output::{Event, Reporter};

pub fn run(args: cli::BootloaderArgs, out: &mut dyn Reporter) -> i32 {
    let opts = super::device_options(&args.device);

    let driver = match api::open_driver(&opts) {
        Ok(d) => d,
        Err(e) => return super::report_error(out, &e),
    };

    match api::clear_boot_magic(&driver, |ev| out.emit(Event::Operation(ev))) {
        Ok(()) => exit_codes::EXIT_OK,
        Err(e) => super::report_error(out, &e),
    }
}
