use std::process::ExitCode;

use clap::Parser;

use audiograb_app::cli::Cli;
use audiograb_app::logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(cli.log_to, grab_logging::level_for_verbosity(cli.verbose));

    // One cooperative scheduler for requests and timers.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("audiograb error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cli.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("audiograb error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
