use camlink_flasher::{api, camlink};

use crate::cli;
use crate::exit_codes;
use crate::output::{Event, Reporter};

pub fn run(args: cli::EraseArgs, out: &mut dyn Reporter) -> i32 {
    let opts = super::device_options(&args.device);

    let driver = match api::open_driver(&opts) {
        Ok(d) => d,
        Err(e) => return super::report_error(out, &e),
    };

    let length = args.length.unwrap_or(u64::from(camlink::SECTOR_SIZE));
    let r = api::erase_range(&driver, args.start, length, |ev| {
        out.emit(Event::Operation(ev))
    });

    match r {
        Ok(()) => exit_codes::EXIT_OK,
        Err(e) => super::report_error(out, &e),
    }
}
