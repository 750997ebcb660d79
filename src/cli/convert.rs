//! Define the convert subcommand
use crate::config::Config;
use crate::extract::{is_supported_path, source_digest};
use crate::{build_track, Error, Track, TrackOutcome};
use log::{debug, error, info, trace, warn};
use std::collections::HashSet;
use std::fs::{create_dir_all, read, read_dir, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use structopt::StructOpt;

/// Convert one or more activity logs directly or within the provided directories
#[derive(Debug, StructOpt)]
pub struct ConvertOpts {
    /// SML or FIT files to convert or directories to search
    #[structopt(name = "PATHS", parse(from_os_str))]
    paths: Vec<PathBuf>,
    /// Search directory paths recursively
    #[structopt(short, long)]
    recursive: bool,
    /// Directory to write tracks to, defaults to the directory of each input file
    #[structopt(short, long, parse(from_os_str))]
    output_dir: Option<PathBuf>,
    /// Do not search the input paths defined in the application config
    #[structopt(long)]
    skip_config_paths: bool,
    /// How to respond to conversion errors
    #[structopt(long, default_value = "warn")]
    errors: ErrorBehavior,
}

/// How we should handle files that were already converted during this run
#[derive(Clone, Copy, Debug)]
enum DuplicateFileBehavior {
    Error,
    Warn,
    Suppress,
}

/// How we should handle files that fail to convert
#[derive(Clone, Copy, Debug)]
enum ErrorBehavior {
    Error,
    Warn,
    Suppress,
}

impl FromStr for ErrorBehavior {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(ErrorBehavior::Error),
            "warn" => Ok(ErrorBehavior::Warn),
            "suppress" => Ok(ErrorBehavior::Suppress),
            _ => Err(Error::InvalidConfigurationValue(format!(
                "Unknown value {}: expected: error, warn, suppress",
                s
            ))),
        }
    }
}

/// Shared state of a single convert run
struct Converter<'c> {
    config: &'c Config,
    output_dir: Option<PathBuf>,
    recursive: bool,
    errors: ErrorBehavior,
    seen_digests: HashSet<String>,
}

/// Implementation of the `convert` subcommand
pub fn convert_command(
    config: Config,
    opts: ConvertOpts,
) -> Result<(), Box<dyn std::error::Error>> {
    // merge paths from config with any user provided ones
    let mut input_paths: Vec<PathBuf> = if opts.skip_config_paths {
        Vec::new()
    } else {
        config.input_paths().iter().map(PathBuf::from).collect()
    };
    input_paths.extend(opts.paths);

    if input_paths.is_empty() {
        return Err(Box::new(Error::Other("No input paths provided".to_string())));
    }

    // only hard error on a duplicate if we have a single file to convert
    let dupe_err = if input_paths.len() == 1 {
        DuplicateFileBehavior::Error
    } else {
        DuplicateFileBehavior::Warn
    };
    let mut converter = Converter {
        output_dir: opts.output_dir.or_else(|| config.output_dir()),
        config: &config,
        recursive: opts.recursive,
        errors: opts.errors,
        seen_digests: HashSet::new(),
    };
    let written = converter.convert_paths(&input_paths, dupe_err)?;
    info!("Converted {} activity log(s)", written.len());

    Ok(())
}

impl Converter<'_> {
    /// convert multiple files as well as handle recursive directory searches
    fn convert_paths(
        &mut self,
        paths: &[PathBuf],
        dupe_err: DuplicateFileBehavior,
    ) -> Result<Vec<PathBuf>, Error> {
        let mut written = Vec::new();
        for path in paths {
            if !path.exists() {
                warn!("Path does not exist: {:?}", path);
                continue;
            }
            if path.is_dir() {
                debug!("Scanning contents of: {:?} for activity logs", path);
                let recursive = self.recursive;
                let new_paths: Vec<PathBuf> = read_dir(path)?
                    .filter_map(|d| d.ok())
                    .map(|d| d.path())
                    .filter(|p| p.is_dir() && recursive || is_supported_path(p))
                    .collect();
                // suppress dupe errors since we're recursing
                written.extend(self.convert_paths(&new_paths, DuplicateFileBehavior::Suppress)?);
                continue;
            }

            match self.convert_file(path) {
                Ok(Some(dest)) => written.push(dest),
                Ok(None) => {}
                Err(e) => match &e {
                    Error::DuplicateFileError(_) => match dupe_err {
                        DuplicateFileBehavior::Error => {
                            error!("{}", e);
                            return Err(e);
                        }
                        DuplicateFileBehavior::Warn => warn!("{}", e),
                        DuplicateFileBehavior::Suppress => trace!("{}", e),
                    },
                    _ => match self.errors {
                        ErrorBehavior::Error => {
                            error!("File {:?}: {}", path, e);
                            return Err(e);
                        }
                        ErrorBehavior::Warn => warn!("File {:?}: {}", path, e),
                        ErrorBehavior::Suppress => trace!("File {:?}: {}", path, e),
                    },
                },
            }
        }

        Ok(written)
    }

    /// Convert a single file, returns the path written or None if there was nothing to write
    fn convert_file(&mut self, path: &Path) -> Result<Option<PathBuf>, Error> {
        trace!("Reading activity log: {:?}", path);
        let content = read(path)?;
        let digest = source_digest(&content);
        if self.seen_digests.contains(&digest) {
            return Err(Error::DuplicateFileError(digest));
        }

        let outcome = build_track(path, &content, digest.clone(), self.config)?;
        self.seen_digests.insert(digest);
        let track = match outcome {
            TrackOutcome::Track(track) => track,
            TrackOutcome::NoUsableData => {
                warn!("No usable samples in {:?}, no track was created", path);
                return Ok(None);
            }
        };

        let dest = self.destination(path)?;
        write_track(&track, &dest)?;
        info!(
            "Successfully converted {:?} to {:?} ({} segments, {} points)",
            path,
            dest,
            track.segments().len(),
            track.point_count()
        );
        Ok(Some(dest))
    }

    fn destination(&self, path: &Path) -> Result<PathBuf, Error> {
        let dir = match &self.output_dir {
            Some(dir) => {
                if !dir.exists() {
                    create_dir_all(dir)?;
                }
                dir.clone()
            }
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let stem = path
            .file_stem()
            .ok_or_else(|| Error::Other(format!("Cannot determine file name of {:?}", path)))?;
        Ok(dir.join(format!("{}.yml", stem.to_string_lossy())))
    }
}

/// Serialize a track as YAML
fn write_track(track: &Track, dest: &Path) -> Result<(), Error> {
    let fp = File::create(dest)?;
    serde_yaml::to_writer(fp, track)?;
    Ok(())
}
