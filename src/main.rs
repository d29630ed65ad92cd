use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use sessions::{logging, run, Cli, Context, EnvConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = EnvConfig::from_env();
    logging::init(config.log_filter.as_deref());

    let result = config
        .store_paths(cli.config_dir)
        .map_err(anyhow::Error::from)
        .and_then(|paths| {
            let ctx = Context::new(&paths, config.session_id.clone());
            let stdout = io::stdout();
            let mut out = stdout.lock();
            run(cli.command, &ctx, &mut out)?;
            out.flush()?;
            Ok(())
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(error = ?error, "command failed");
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
