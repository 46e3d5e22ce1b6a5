use std::process::ExitCode;

use clap::Parser;

use flatlayer::cli::{run, CliArgs};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // --verbose raises the default filter; RUST_LOG still wins when set.
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    run(args)
}
