//! Define the application's command line interface
use crate::config::Config;
use simplelog::LevelFilter;
use std::path::PathBuf;
use structopt::StructOpt;

mod convert;
use convert::{convert_command, ConvertOpts};
mod show;
use show::{show_command, ShowOpts};

/// Rebuild lap segmented tracks from SML and FIT activity logs
#[derive(Debug, StructOpt)]
#[structopt(name = "activity-track")]
pub struct Cli {
    /// Set logging level to debug, use a second time (e.g. -vv) to set logging to trace
    #[structopt(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Suppress info logging messages use a second time (e.g. -qq) to hide warnings
    #[structopt(short, long, parse(from_occurrences))]
    quiet: i32,
    /// Configuration file to use instead of the default location
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

impl Cli {
    /// Return the verbose flag counts as a log level filter
    pub fn verbosity(&self, default: LevelFilter) -> LevelFilter {
        if self.quiet == 1 {
            LevelFilter::Warn
        } else if self.quiet > 1 {
            LevelFilter::Error
        } else if self.verbose == 1 {
            LevelFilter::Debug
        } else if self.verbose > 1 {
            LevelFilter::Trace
        } else {
            default
        }
    }

    /// Configuration file requested on the command line
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config.as_ref()
    }

    /// Consume options struct and return the result of subcommand execution
    pub fn execute_subcommand(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        self.cmd.execute(config)
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Convert activity logs into track files
    #[structopt(name = "convert")]
    Convert(ConvertOpts),
    /// Show track information and lap segments of an activity log
    #[structopt(name = "show")]
    Show(ShowOpts),
}

impl Command {
    /// Consume enum variant and return the result of the command's execution
    fn execute(self, config: Config) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Command::Convert(opts) => convert_command(config, opts),
            Command::Show(opts) => show_command(config, opts),
        }
    }
}
