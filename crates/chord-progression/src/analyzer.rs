use midi_events::{Event, Sequence};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chords::{ChordIdentifier, FirstFitIdentifier};
use crate::cluster::{cluster_notes, sounding_notes, DEFAULT_GROUPING_THRESHOLD_MS};
use crate::progression::{build_progression, ChordSpan};
use crate::tick_clock::{TempoMap, TickClock};

/// Which tracks to read and how close notes must be to count as one chord.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChordProgressionRequest {
    /// `None` reads every track
    pub track_filter: Option<Vec<usize>>,
    pub grouping_threshold_ms: f64,
}

impl Default for ChordProgressionRequest {
    fn default() -> Self {
        Self {
            track_filter: None,
            grouping_threshold_ms: DEFAULT_GROUPING_THRESHOLD_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordEntry {
    pub name: String,
    pub start_tick: u64,
    pub end_tick: u64,
    pub duration_ticks: u64,
    pub notes: Vec<u8>,
}

impl From<ChordSpan> for ChordEntry {
    fn from(span: ChordSpan) -> Self {
        Self {
            duration_ticks: span.duration_ticks(),
            name: span.name,
            start_tick: span.start_tick,
            end_tick: span.end_tick,
            notes: span.notes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordProgression {
    pub chord_count: usize,
    pub chords: Vec<ChordEntry>,
}

impl ChordProgression {
    fn from_spans(spans: Vec<ChordSpan>) -> Self {
        Self {
            chord_count: spans.len(),
            chords: spans.into_iter().map(ChordEntry::from).collect(),
        }
    }
}

/// Cluster → identify → build, with a swappable identifier.
#[derive(Debug, Clone, Default)]
pub struct ProgressionAnalyzer<I = FirstFitIdentifier> {
    identifier: I,
}

impl ProgressionAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<I: ChordIdentifier> ProgressionAnalyzer<I> {
    pub fn with_identifier(identifier: I) -> Self {
        Self { identifier }
    }

    /// Progression of `events` timed against `tempo_map`.
    ///
    /// `events` need not be sorted; only sounding note-ons are read.
    pub fn analyze(
        &self,
        events: &[Event],
        tempo_map: TempoMap,
        ppq: u16,
        threshold_ms: f64,
    ) -> crate::Result<ChordProgression> {
        validate_threshold(threshold_ms)?;
        let clock = TickClock::new(tempo_map, ppq)?;

        let notes = sounding_notes(events);
        let Some(&(last_note_tick, _)) = notes.last() else {
            debug!("no sounding notes, empty progression");
            return Ok(ChordProgression::default());
        };

        let clusters = cluster_notes(&notes, &clock, threshold_ms);
        let spans = build_progression(&clusters, last_note_tick, &self.identifier);
        info!(
            notes = notes.len(),
            clusters = clusters.len(),
            chords = spans.len(),
            threshold_ms,
            "chord progression built"
        );

        Ok(ChordProgression::from_spans(spans))
    }

    /// Progression for the request's tracks of a decoded file.
    ///
    /// Tempo is read from every track, so excluding the conductor track does
    /// not change the clock.
    pub fn analyze_sequence(
        &self,
        sequence: &Sequence,
        request: &ChordProgressionRequest,
    ) -> crate::Result<ChordProgression> {
        let tracks = request.track_filter.as_deref();
        if let Some(indexes) = tracks {
            sequence.check_track_indexes(indexes)?;
        }

        let tempo_map = TempoMap::from_events(&sequence.merged(None));
        let events = sequence.merged(tracks);
        self.analyze(&events, tempo_map, sequence.ppq, request.grouping_threshold_ms)
    }
}

/// Chord progression of an event list, using that list's own tempo events.
pub fn analyze_chords(events: &[Event], ppq: u16, threshold_ms: f64) -> crate::Result<ChordProgression> {
    ProgressionAnalyzer::new().analyze(events, TempoMap::from_events(events), ppq, threshold_ms)
}

/// Chord progression for a decoded file with the default identifier.
pub fn chord_progression(
    sequence: &Sequence,
    request: &ChordProgressionRequest,
) -> crate::Result<ChordProgression> {
    ProgressionAnalyzer::new().analyze_sequence(sequence, request)
}

fn validate_threshold(threshold_ms: f64) -> crate::Result<()> {
    if threshold_ms.is_finite() && threshold_ms >= 0.0 {
        Ok(())
    } else {
        Err(crate::Error::InvalidThreshold(threshold_ms))
    }
}
