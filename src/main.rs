use clap::error::ErrorKind;
use clap::Parser;

use dockhand::logging::Logger;
use dockhand::pipeline;

mod commands;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "dockhand")]
#[command(version = VERSION)]
#[command(about = "Provision a remote host and deploy a containerized application over SSH")]
struct Cli {
    /// Tear down the deployed container, image, proxy site, and files
    #[arg(long)]
    cleanup: bool,
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                // Unrecognized arguments are an input error, not a usage
                // formality; the printed message carries the usage text.
                _ => 1,
            };
            let _ = err.print();
            return std::process::ExitCode::from(code);
        }
    };

    let logger = match Logger::create(std::path::Path::new(".")) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("cannot open run log: {}", err);
            return std::process::ExitCode::from(1);
        }
    };

    let result = if cli.cleanup {
        commands::cleanup::run(&logger)
    } else {
        commands::deploy::run(&logger)
    };

    let code = pipeline::finish(&logger, &result);
    std::process::ExitCode::from(exit_code_to_u8(code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
