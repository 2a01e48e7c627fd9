use std::process;

use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod logging;
mod output;

fn main() {
    logging::init_tracing();

    let cli = cli::Cli::parse();

    let exit_code = match cli.command {
        cli::Command::Dump(args) => {
            let mut out = output::make(&args.output);
            let code = commands::dump::run(args, &mut *out);
            out.finish();
            code
        }
        cli::Command::Program(args) => {
            let mut out = output::make(&args.output);
            let code = commands::program::run(args, &mut *out);
            out.finish();
            code
        }
        cli::Command::Erase(args) => {
            let mut out = output::make(&args.output);
            let code = commands::erase::run(args, &mut *out);
            out.finish();
            code
        }
        cli::Command::Bootloader(args) => {
            let mut out = output::make(&args.output);
            let code = commands::bootloader::run(args, &mut *out);
            out.finish();
            code
        }
        cli::Command::List(args) => {
            let mut out = output::make_for_list(&args);
            let code = commands::list::run(args, &mut *out);
            out.finish();
            code
        }
    };

    process::exit(exit_code);
}
