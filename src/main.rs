mod args;
mod star;

use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = star::run_election(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
