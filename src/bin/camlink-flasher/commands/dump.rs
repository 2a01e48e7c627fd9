use camlink_flasher::api;

use crate::cli;
use crate::exit_codes;
use crate::output::{Event, Reporter};

pub fn run(args: cli::DumpArgs, out: &mut dyn Reporter) -> i32 {
    let opts = super::device_options(&args.device);

    let driver = match api::open_driver(&opts) {
        Ok(d) => d,
        Err(e) => return super::report_error(out, &e),
    };

    let length = args.length.unwrap_or_else(api::full_flash_length);
    let r = api::dump_to_path(&driver, &args.out, args.start, length, |ev| {
        out.emit(Event::Operation(ev))
    });

    match r {
        Ok(total) => {
            tracing::info!(total, out = %args.out.display(), "dump complete");
            exit_codes::EXIT_OK
        }
        Err(e) => super::report_error(out, &e),
    }
}
