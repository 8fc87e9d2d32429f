//! Tempo, time-signature and key-signature maps from a merged event list.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{Event, MetaKind};
use crate::sequence::Sequence;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoInfo {
    pub tick: u64,
    /// Rounded to two decimal places
    pub bpm: f64,
    pub microseconds_per_beat: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSignature {
    pub tick: u64,
    pub numerator: u8,
    pub denominator: u32,
    pub clocks_per_click: u8,
    pub notes_per_quarter: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySignature {
    pub tick: u64,
    /// Positive = sharps, negative = flats
    pub sharps_flats: i8,
    pub major: bool,
}

/// Everything one linear scan over the events yields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceMetadata {
    pub tempo: Vec<TempoInfo>,
    pub time_signature: Vec<TimeSignature>,
    pub key_signature: Vec<KeySignature>,
    pub total_ticks: u64,
    pub total_events: usize,
}

/// File-level summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MidiSummary {
    pub format: u8,
    pub ppq: u16,
    pub total_ticks: u64,
    pub track_count: usize,
    pub total_events: usize,
    pub tempo_info: Vec<TempoInfo>,
    pub time_signature: Vec<TimeSignature>,
    pub key_signature: Vec<KeySignature>,
}

/// Scan a merged, tick-ordered event list into tempo/meter/key maps.
///
/// Records with malformed payloads are skipped, never reported as errors.
pub fn extract_metadata(events: &[Event]) -> SequenceMetadata {
    let mut metadata = SequenceMetadata {
        total_events: events.len(),
        ..Default::default()
    };

    for event in events {
        metadata.total_ticks = metadata.total_ticks.max(event.tick);

        let Some(kind) = event.meta_kind() else {
            continue;
        };
        let Some(payload) = event.meta_payload(kind) else {
            continue;
        };

        match kind {
            MetaKind::SetTempo => match decode_tempo(event.tick, payload) {
                Some(tempo) => metadata.tempo.push(tempo),
                None => debug!(tick = event.tick, len = payload.len(), "skipping malformed tempo"),
            },
            MetaKind::TimeSignature => match decode_time_signature(event.tick, payload) {
                Some(ts) => metadata.time_signature.push(ts),
                None => debug!(tick = event.tick, "skipping malformed time signature"),
            },
            MetaKind::KeySignature => match decode_key_signature(event.tick, payload) {
                Some(ks) => metadata.key_signature.push(ks),
                None => debug!(tick = event.tick, "skipping malformed key signature"),
            },
            _ => {}
        }
    }

    metadata
}

/// Build the file summary from every track.
pub fn summarize(sequence: &Sequence) -> MidiSummary {
    let metadata = extract_metadata(&sequence.merged(None));

    MidiSummary {
        format: sequence.format,
        ppq: sequence.ppq,
        total_ticks: metadata.total_ticks,
        track_count: sequence.track_count(),
        total_events: sequence.total_events(),
        tempo_info: metadata.tempo,
        time_signature: metadata.time_signature,
        key_signature: metadata.key_signature,
    }
}

/// Exactly three bytes, big-endian microseconds per quarter note.
pub fn decode_tempo(tick: u64, payload: &[u8]) -> Option<TempoInfo> {
    let &[b0, b1, b2] = payload else {
        return None;
    };
    let microseconds_per_beat = (b0 as u32) << 16 | (b1 as u32) << 8 | b2 as u32;
    if microseconds_per_beat == 0 {
        return None;
    }

    Some(TempoInfo {
        tick,
        bpm: round_to_hundredths(60_000_000.0 / microseconds_per_beat as f64),
        microseconds_per_beat,
    })
}

/// `[numerator, denominator exponent, clocks per click, 32nds per quarter]`.
///
/// Missing trailing bytes take the conventional 4/4, 24, 8 values; an empty
/// payload or an unrepresentable denominator is rejected.
pub fn decode_time_signature(tick: u64, payload: &[u8]) -> Option<TimeSignature> {
    if payload.is_empty() {
        return None;
    }
    let byte = |i: usize, default: u8| payload.get(i).copied().unwrap_or(default);
    let denominator = 1u32.checked_shl(byte(1, 2) as u32)?;

    Some(TimeSignature {
        tick,
        numerator: byte(0, 4),
        denominator,
        clocks_per_click: byte(2, 24),
        notes_per_quarter: byte(3, 8),
    })
}

/// `[sharps/flats as two's complement, mode]`, mode 0 = major.
pub fn decode_key_signature(tick: u64, payload: &[u8]) -> Option<KeySignature> {
    let sharps_flats = *payload.first()? as i8;
    let major = payload.get(1).map_or(true, |&mode| mode == 0);

    Some(KeySignature {
        tick,
        sharps_flats,
        major,
    })
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
