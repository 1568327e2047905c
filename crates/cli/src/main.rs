use std::io;

use clap::Parser;

mod args;
mod boot;
mod conf;
mod run;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = args::Cli::parse();
    boot::init_logging(cli.verbose);

    let config = conf::CliConfig::load(cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run::run(&cli, &config, &mut out)?;
    Ok(())
}
