//! Decoded MIDI events and the structure that can be read straight off them:
//! tempo, time-signature and key-signature maps, per-track summaries and
//! filtered event views.

pub mod event;
pub mod filter;
pub mod metadata;
pub mod sequence;
pub mod tracks;

pub use event::{Event, EventDetails, EventKind, MetaKind};
pub use filter::{EventFilter, TimeRange, ValueFilter};
pub use metadata::{
    extract_metadata, summarize, KeySignature, MidiSummary, SequenceMetadata, TempoInfo,
    TimeSignature,
};
pub use sequence::{DecodeIssue, DecodeIssueKind, Sequence, DEFAULT_PPQ};
pub use tracks::{analyze_track, analyze_tracks, track_details, TrackDetails, TrackFilter, TrackInfo};

/// Errors from decoding and track selection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI parse error: {0}")]
    MidiParse(String),

    #[error("Track index {index} is out of range. File has {track_count} tracks.")]
    TrackOutOfRange { index: usize, track_count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
