//! Chord progressions from decoded MIDI events.
//!
//! Sounding note-ons are grouped into clusters of near-simultaneous notes
//! (gap measured in milliseconds against the full tempo map), each cluster is
//! named against a fixed chord dictionary, and consecutive repeats collapse
//! into tick spans.

pub mod analyzer;
pub mod chord_templates;
pub mod chords;
pub mod cluster;
pub mod progression;
pub mod tick_clock;

pub use analyzer::{
    analyze_chords, chord_progression, ChordEntry, ChordProgression, ChordProgressionRequest,
    ProgressionAnalyzer,
};
pub use chords::{identify_chord, ChordIdentifier, ChordMatch, FirstFitIdentifier};
pub use cluster::{cluster_events, cluster_notes, NoteCluster, DEFAULT_GROUPING_THRESHOLD_MS};
pub use progression::{build_progression, ChordSpan};
pub use tick_clock::{ticks_to_milliseconds, TempoMap, TempoMarker, TickClock};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("PPQ must be greater than zero")]
    InvalidPpq,

    #[error("grouping threshold must be a finite, non-negative number of milliseconds, got {0}")]
    InvalidThreshold(f64),

    #[error("Track index {index} is out of range. File has {track_count} tracks.")]
    TrackOutOfRange { index: usize, track_count: usize },

    #[error(transparent)]
    Events(midi_events::Error),
}

impl From<midi_events::Error> for Error {
    fn from(err: midi_events::Error) -> Self {
        match err {
            midi_events::Error::TrackOutOfRange { index, track_count } => {
                Self::TrackOutOfRange { index, track_count }
            }
            other => Self::Events(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
