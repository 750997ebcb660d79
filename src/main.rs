use activity_track::cli::Cli;
use activity_track::config::{config_file, Config};
use log::debug;
use simplelog::{Config as LogConfig, TermLogger, TerminalMode};
use std::fs::File;
use structopt::StructOpt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Cli::from_args();

    // an explicitly requested config file must exist, the default one is optional
    let config = match opt.config_path() {
        Some(path) => Config::load(&mut File::open(path)?)?,
        None => {
            let path = config_file();
            if path.exists() {
                Config::load(&mut File::open(&path)?)?
            } else {
                Config::default()
            }
        }
    };

    let level_filter = opt.verbosity(config.log_level());
    TermLogger::init(level_filter, LogConfig::default(), TerminalMode::Mixed)?;
    debug!("Using configuration: {:?}", config);

    // execute any subcommands
    opt.execute_subcommand(config)
}
