//! One function per subcommand. Each returns the value printed as JSON.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chord_progression::{ChordProgression, ChordProgressionRequest};
use midi_events::{
    summarize, track_details, DecodeIssue, EventDetails, EventFilter, MidiSummary, Sequence,
    TimeRange, TrackFilter, TrackInfo, ValueFilter,
};
use scopeconf::ScopeConfig;
use serde::Serialize;
use tracing::debug;

/// A decoded file and its content hash.
pub struct LoadedFile {
    pub file_id: String,
    pub path: PathBuf,
    pub sequence: Sequence,
}

/// Read and decode `path`, using the configured PPQ for non-metrical timing.
pub fn open(path: &Path, config: &ScopeConfig) -> Result<LoadedFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("File not found: {}", path.display()))?;
    let sequence = Sequence::parse_with_fallback_ppq(&bytes, config.analysis.fallback_ppq)
        .with_context(|| format!("Failed to load MIDI file: {}", path.display()))?;

    debug!(
        path = %path.display(),
        tracks = sequence.track_count(),
        ppq = sequence.ppq,
        "decoded MIDI file"
    );

    Ok(LoadedFile {
        file_id: content_id(&bytes),
        path: path.to_path_buf(),
        sequence,
    })
}

/// First 128 bits of the BLAKE3 hash, as hex.
pub fn content_id(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex()[..32].to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub file_id: String,
    pub file_path: String,
    pub format: u8,
    pub track_count: usize,
    pub ppq: u16,
    pub total_events: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decode_issues: Vec<DecodeIssue>,
}

#[derive(Debug, Serialize)]
pub struct TrackReport {
    pub track: TrackInfo,
    pub events: Vec<EventDetails>,
}

#[derive(Debug, Serialize)]
pub struct EventsReport {
    pub events: Vec<EventDetails>,
}

pub fn load(path: &Path, config: &ScopeConfig) -> Result<LoadReport> {
    let file = open(path, config)?;
    Ok(LoadReport {
        file_id: file.file_id,
        file_path: file.path.display().to_string(),
        format: file.sequence.format,
        track_count: file.sequence.track_count(),
        ppq: file.sequence.ppq,
        total_events: file.sequence.total_events(),
        decode_issues: file.sequence.issues,
    })
}

pub fn summary(path: &Path, config: &ScopeConfig) -> Result<MidiSummary> {
    let file = open(path, config)?;
    Ok(summarize(&file.sequence))
}

pub fn tracks(path: &Path, filter: TrackFilter, config: &ScopeConfig) -> Result<Vec<TrackInfo>> {
    let file = open(path, config)?;
    Ok(filter.apply(&midi_events::analyze_tracks(&file.sequence)))
}

pub fn track(
    path: &Path,
    index: usize,
    time_range: Option<TimeRange>,
    event_types: &[String],
    values: ValueFilter,
    config: &ScopeConfig,
) -> Result<TrackReport> {
    let file = open(path, config)?;
    let details = track_details(&file.sequence, index, time_range, event_types, values)?;
    Ok(TrackReport {
        track: details.track,
        events: details.events.iter().map(|e| e.details()).collect(),
    })
}

pub fn events(
    path: &Path,
    tracks: &[usize],
    filter: &EventFilter,
    config: &ScopeConfig,
) -> Result<EventsReport> {
    let file = open(path, config)?;
    let track_filter = (!tracks.is_empty()).then_some(tracks);
    if let Some(indexes) = track_filter {
        file.sequence.check_track_indexes(indexes)?;
    }

    let merged = file.sequence.merged(track_filter);
    let events = if filter.is_empty() {
        merged
    } else {
        filter.apply(&merged)
    };

    Ok(EventsReport {
        events: events.iter().map(|e| e.details()).collect(),
    })
}

pub fn chords(
    path: &Path,
    tracks: &[usize],
    threshold_ms: Option<f64>,
    config: &ScopeConfig,
) -> Result<ChordProgression> {
    let file = open(path, config)?;
    let request = ChordProgressionRequest {
        track_filter: (!tracks.is_empty()).then(|| tracks.to_vec()),
        grouping_threshold_ms: threshold_ms.unwrap_or(config.analysis.grouping_threshold_ms),
    };
    Ok(chord_progression::chord_progression(&file.sequence, &request)?)
}

/// `--start`/`--end` into an inclusive range; both or neither must be given.
pub fn time_range(start: Option<u64>, end: Option<u64>) -> Result<Option<TimeRange>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start_tick), Some(end_tick)) if start_tick <= end_tick => Ok(Some(TimeRange {
            start_tick,
            end_tick,
        })),
        (Some(start), Some(end)) => bail!("start tick {start} is after end tick {end}"),
        _ => bail!("--start and --end must be given together"),
    }
}
