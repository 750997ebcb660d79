//! Define show subcommand
use crate::config::Config;
use crate::{build_track_from_file, Track, TrackOutcome};
use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;
use structopt::StructOpt;

/// Show track information and the lap segments of an activity log
#[derive(Debug, StructOpt)]
pub struct ShowOpts {
    /// SML or FIT file to read
    #[structopt(name = "FILE", parse(from_os_str))]
    file: PathBuf,
}

pub fn show_command(config: Config, opts: ShowOpts) -> Result<(), Box<dyn std::error::Error>> {
    match build_track_from_file(&opts.file, &config)? {
        TrackOutcome::Track(track) => print_track(&track),
        TrackOutcome::NoUsableData => println!("{:?} contains no usable samples", opts.file),
    }
    Ok(())
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn print_track(track: &Track) {
    let info = track.info();
    if let Some(name) = &info.name {
        println!("Name: {}", name);
    }
    if let Some(desc) = &info.description {
        println!("Activity: {}", desc);
    }
    if let Some(comment) = &info.comment {
        for line in comment.lines() {
            println!("{}", line);
        }
    }
    if let Some(digest) = &info.source_digest {
        println!("SHA-256: {}", digest);
    }

    println!("Segment\tStart\t\t\tEnd\t\t\tPoints");
    for (idx, segment) in track.segments().iter().enumerate() {
        match segment.time_span() {
            Some((start, end)) => println!(
                "{}\t{}\t{}\t{}",
                idx + 1,
                format_time(start),
                format_time(end),
                segment.len()
            ),
            None => println!("{}\t-\t\t\t-\t\t\t0", idx + 1),
        }
    }
    println!("Total points: {}", track.point_count());
}
