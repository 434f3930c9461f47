use std::process::ExitCode;

use clap::Parser;

mod args;
mod cmd;
mod io;
mod output;

fn main() -> ExitCode {
    let cli = args::Cli::parse();
    output::init_logging(cli.verbose);

    match cmd::dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            output::error_line(&format!("error: {e:#}"));
            ExitCode::from(2)
        }
    }
}
