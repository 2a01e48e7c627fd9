use camlink_flasher::api;

use crate::cli;
use crate::exit_codes;
use crate::output::{Event, Reporter};

pub fn run(args: cli::ProgramArgs, out: &mut dyn Reporter) -> i32 {
    let opts = super::device_options(&args.device);

    let driver = match api::open_driver(&opts) {
        Ok(d) => d,
        Err(e) => return super::report_error(out, &e),
    };

    let r = api::program_from_path(&driver, &args.image, args.start, args.length, |ev| {
        out.emit(Event::Operation(ev))
    });

    match r {
        Ok(total) => {
            tracing::info!(total, image = %args.image.display(), "program complete");
            exit_codes::EXIT_OK
        }
        Err(e) => super::report_error(out, &e),
    }
}
