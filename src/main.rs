// src/main.rs

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::process::ExitCode;

use vuls_log_converter::app::App;
use vuls_log_converter::cli::{Args, Settings};
use vuls_log_converter::error::ConvertError;
use vuls_log_converter::logging::initialize_logging;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("[WARN] : {e}");
    }
    let args = Args::parse();

    if let Err(e) = initialize_logging(args.verbose) {
        eprintln!("[WARN] : logging disabled: {e}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("[ERROR] : {report:?}");
            // Config problems exit with 2, everything else with 1
            let code = report.downcast_ref::<ConvertError>().map(ConvertError::exit_code).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = Settings::from_args(args).wrap_err("invalid arguments")?;
    App::new(settings).run().await?;
    Ok(())
}
