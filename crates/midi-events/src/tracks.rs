use serde::{Deserialize, Serialize};

use crate::event::{Event, EventKind, MetaKind};
use crate::filter::{EventFilter, TimeRange, ValueFilter};
use crate::sequence::Sequence;

/// Per-track summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    /// Channel of the first sounding note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    /// Last program change seen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<u8>,
    pub event_count: usize,
    pub note_count: usize,
    pub start_tick: u64,
    pub end_tick: u64,
}

/// One track's info plus its (filtered) events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDetails {
    pub track: TrackInfo,
    pub events: Vec<Event>,
}

/// Narrow a track list by channel and/or program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFilter {
    pub channel: Option<u8>,
    pub program: Option<u8>,
}

impl TrackFilter {
    pub fn matches(&self, track: &TrackInfo) -> bool {
        self.channel.map_or(true, |c| track.channel == Some(c))
            && self.program.map_or(true, |p| track.program == Some(p))
    }

    pub fn apply(&self, tracks: &[TrackInfo]) -> Vec<TrackInfo> {
        tracks.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

/// Summarize one track.
pub fn analyze_track(sequence: &Sequence, track_index: usize) -> crate::Result<TrackInfo> {
    sequence.check_track_indexes(&[track_index])?;
    Ok(profile_track(track_index, &sequence.tracks[track_index]))
}

/// Summarize every track in file order.
pub fn analyze_tracks(sequence: &Sequence) -> Vec<TrackInfo> {
    sequence
        .tracks
        .iter()
        .enumerate()
        .map(|(index, events)| profile_track(index, events))
        .collect()
}

/// A track's info and its events narrowed by time range, type and values.
pub fn track_details(
    sequence: &Sequence,
    track_index: usize,
    time_range: Option<TimeRange>,
    event_types: &[String],
    values: ValueFilter,
) -> crate::Result<TrackDetails> {
    let track = analyze_track(sequence, track_index)?;
    let filter = EventFilter {
        time_range,
        event_types: event_types.to_vec(),
        values,
        ..Default::default()
    };

    Ok(TrackDetails {
        track,
        events: filter.apply(&sequence.tracks[track_index]),
    })
}

fn profile_track(index: usize, events: &[Event]) -> TrackInfo {
    let mut info = TrackInfo {
        index,
        name: None,
        instrument: None,
        channel: None,
        program: None,
        event_count: events.len(),
        note_count: 0,
        start_tick: events.first().map_or(0, |e| e.tick),
        end_tick: 0,
    };

    for event in events {
        match &event.kind {
            EventKind::Meta {
                kind: MetaKind::TrackName,
                data,
            } => info.name = Some(String::from_utf8_lossy(data).into_owned()),
            EventKind::Meta {
                kind: MetaKind::InstrumentName,
                data,
            } => info.instrument = Some(String::from_utf8_lossy(data).into_owned()),
            EventKind::ProgramChange { program } => info.program = Some(*program),
            EventKind::NoteOn { velocity, .. } if *velocity > 0 => {
                info.note_count += 1;
                if info.channel.is_none() {
                    info.channel = event.channel;
                }
            }
            _ => {}
        }
        info.end_tick = info.end_tick.max(event.tick);
    }

    info
}
