//! midiscope - inspect Standard MIDI Files from the command line
//!
//! Subcommands:
//! - `midiscope load <file>` - decode a file and report its content id
//! - `midiscope summary <file>` - tempo, time and key signature maps
//! - `midiscope tracks <file>` - per-track summaries
//! - `midiscope track <file> <index>` - one track with its events
//! - `midiscope events <file>` - filtered event list
//! - `midiscope chords <file>` - chord progression
//! - `midiscope config` - effective configuration
//!
//! Every subcommand except `config` prints JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use midi_events::{EventFilter, TrackFilter, ValueFilter};
use scopeconf::ScopeConfig;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "midiscope")]
#[command(about = "Inspect MIDI files: metadata, tracks, events and chord progressions")]
#[command(version)]
struct Cli {
    /// Config file to use in place of ./midiscope.toml
    #[arg(long, global = true, env = "MIDISCOPE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a MIDI file and report its id, format and size
    Load {
        /// Path to a Standard MIDI File
        file: PathBuf,
    },

    /// Format, PPQ, totals and the tempo/time/key signature maps
    Summary {
        /// Path to a Standard MIDI File
        file: PathBuf,
    },

    /// Per-track name, instrument, channel, program and note counts
    Tracks {
        /// Path to a Standard MIDI File
        file: PathBuf,

        /// Only tracks whose first note plays on this channel
        #[arg(long)]
        channel: Option<u8>,

        /// Only tracks whose last program change is this program
        #[arg(long)]
        program: Option<u8>,
    },

    /// One track's summary and its events
    Track {
        /// Path to a Standard MIDI File
        file: PathBuf,

        /// Track index (0-based)
        index: usize,

        #[command(flatten)]
        range: RangeArgs,

        /// Event types to keep (noteOn, controller, meta, ...)
        #[arg(long = "type")]
        types: Vec<String>,

        #[command(flatten)]
        values: ValueArgs,
    },

    /// Events of all (or selected) tracks merged by tick, with filters
    Events {
        /// Path to a Standard MIDI File
        file: PathBuf,

        /// Track indexes to read (default: all)
        #[arg(long = "track")]
        tracks: Vec<usize>,

        #[command(flatten)]
        range: RangeArgs,

        /// Event types to keep (noteOn, controller, meta, ...)
        #[arg(long = "type")]
        types: Vec<String>,

        /// MIDI channels to keep (0-15)
        #[arg(long = "channel")]
        channels: Vec<u8>,

        #[command(flatten)]
        values: ValueArgs,

        /// Meta event types to keep (trackName, marker, setTempo, ...)
        #[arg(long = "meta-type")]
        meta_types: Vec<String>,
    },

    /// Chord progression from notes grouped by onset time
    Chords {
        /// Path to a Standard MIDI File
        file: PathBuf,

        /// Track indexes to read (default: all)
        #[arg(long = "track")]
        tracks: Vec<usize>,

        /// Max gap between notes of one chord, in milliseconds
        #[arg(long)]
        threshold_ms: Option<f64>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct RangeArgs {
    /// First tick to keep (inclusive)
    #[arg(long)]
    start: Option<u64>,

    /// Last tick to keep (inclusive)
    #[arg(long)]
    end: Option<u64>,
}

#[derive(Args)]
struct ValueArgs {
    /// First positional value (note, controller, program, ...)
    #[arg(long)]
    value1: Option<u32>,

    /// Second positional value (velocity, controller value, ...)
    #[arg(long)]
    value2: Option<u32>,

    /// Third positional value
    #[arg(long)]
    value3: Option<u32>,
}

impl From<ValueArgs> for ValueFilter {
    fn from(args: ValueArgs) -> Self {
        Self {
            value1: args.value1,
            value2: args.value2,
            value3: args.value3,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ScopeConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.telemetry.log_level);

    match cli.command {
        Commands::Load { file } => print_json(&commands::load(&file, &config)?),
        Commands::Summary { file } => print_json(&commands::summary(&file, &config)?),
        Commands::Tracks {
            file,
            channel,
            program,
        } => print_json(&commands::tracks(
            &file,
            TrackFilter { channel, program },
            &config,
        )?),
        Commands::Track {
            file,
            index,
            range,
            types,
            values,
        } => {
            let time_range = commands::time_range(range.start, range.end)?;
            print_json(&commands::track(
                &file,
                index,
                time_range,
                &types,
                values.into(),
                &config,
            )?)
        }
        Commands::Events {
            file,
            tracks,
            range,
            types,
            channels,
            values,
            meta_types,
        } => {
            let filter = EventFilter {
                time_range: commands::time_range(range.start, range.end)?,
                event_types: types,
                channels,
                values: values.into(),
                meta_types,
            };
            print_json(&commands::events(&file, &tracks, &filter, &config)?)
        }
        Commands::Chords {
            file,
            tracks,
            threshold_ms,
        } => print_json(&commands::chords(&file, &tracks, threshold_ms, &config)?),
        Commands::Config => {
            print!("{}", config.to_toml());
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays pure JSON. `RUST_LOG` wins over the
/// configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
