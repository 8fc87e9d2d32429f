use midly::{EventBytemapIter, EventIter, MidiMessage, TrackEventKind};
use serde::Serialize;
use tracing::{debug, warn};

use crate::event::{Event, EventKind, MetaKind};

/// PPQ assumed when the file uses SMPTE timing or declares zero.
pub const DEFAULT_PPQ: u16 = 480;

/// A decoded Standard MIDI File: per-track events with absolute ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub format: u8,
    pub ppq: u16,
    pub tracks: Vec<Vec<Event>>,
    /// Events the decoder could not read cleanly, in file order.
    pub issues: Vec<DecodeIssue>,
}

/// Something the track decoder had to work around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeIssue {
    pub track_index: usize,
    pub tick: u64,
    pub kind: DecodeIssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DecodeIssueKind {
    /// A meta event midly rejected, kept with its raw payload.
    RawMeta {
        #[serde(rename = "metaType")]
        meta_type: u8,
    },
    /// An undecodable event; the rest of the track was dropped.
    Truncated {
        #[serde(rename = "unreadBytes")]
        unread_bytes: usize,
    },
}

impl Sequence {
    /// Decode SMF bytes, falling back to [`DEFAULT_PPQ`] for non-metrical timing.
    pub fn parse(midi_bytes: &[u8]) -> crate::Result<Self> {
        Self::parse_with_fallback_ppq(midi_bytes, DEFAULT_PPQ)
    }

    pub fn parse_with_fallback_ppq(midi_bytes: &[u8], fallback_ppq: u16) -> crate::Result<Self> {
        let (header, track_iter) =
            midly::parse(midi_bytes).map_err(|e| crate::Error::MidiParse(e.to_string()))?;
        let fallback_ppq = if fallback_ppq == 0 { DEFAULT_PPQ } else { fallback_ppq };

        let ppq = match header.timing {
            midly::Timing::Metrical(ticks) if ticks.as_int() > 0 => ticks.as_int(),
            midly::Timing::Metrical(_) => {
                warn!(fallback_ppq, "metrical timing declares zero PPQ, using fallback");
                fallback_ppq
            }
            midly::Timing::Timecode(_, _) => {
                debug!(fallback_ppq, "SMPTE timing, using fallback PPQ");
                fallback_ppq
            }
        };

        let format = match header.format {
            midly::Format::SingleTrack => 0,
            midly::Format::Parallel => 1,
            midly::Format::Sequential => 2,
        };

        let mut tracks = Vec::new();
        let mut issues = Vec::new();
        for (track_index, events) in track_iter.enumerate() {
            let events = events.map_err(|e| crate::Error::MidiParse(e.to_string()))?;
            tracks.push(decode_track(events.bytemapped(), track_index, &mut issues));
        }

        Ok(Self {
            format,
            ppq,
            tracks,
            issues,
        })
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Sum of per-track event counts.
    pub fn total_events(&self) -> usize {
        self.tracks.iter().map(Vec::len).sum()
    }

    /// Fail with `TrackOutOfRange` for the first index past the last track.
    pub fn check_track_indexes(&self, indexes: &[usize]) -> crate::Result<()> {
        match indexes.iter().copied().find(|&i| i >= self.tracks.len()) {
            Some(index) => Err(crate::Error::TrackOutOfRange {
                index,
                track_count: self.tracks.len(),
            }),
            None => Ok(()),
        }
    }

    /// All events (or those of `track_filter`) merged and sorted by tick.
    ///
    /// The sort is stable: ties keep track order, then per-track order.
    pub fn merged(&self, track_filter: Option<&[usize]>) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(index, _)| track_filter.map_or(true, |wanted| wanted.contains(index)))
            .flat_map(|(_, track)| track.iter().cloned())
            .collect();
        events.sort_by_key(|e| e.tick);
        events
    }
}

/// Walk one track, summing deltas into absolute ticks.
///
/// midly stops a track at the first event it cannot read. A rejected meta
/// event (e.g. a one-byte key signature) is kept with its raw payload and
/// decoding resumes after it; anything else ends the track there.
fn decode_track(
    mut events: EventBytemapIter<'_>,
    track_index: usize,
    issues: &mut Vec<DecodeIssue>,
) -> Vec<Event> {
    let mut decoded = Vec::new();
    let mut tick: u64 = 0;

    loop {
        let remaining = events.unread();
        match events.next() {
            Some(Ok((raw, event))) => {
                tick += u64::from(event.delta.as_int());
                decoded.push(convert_event(raw, event.kind, tick, track_index));
            }
            None if remaining.is_empty() => break,
            Some(Err(_)) | None => match split_raw_meta_event(remaining) {
                Some((delta, meta_type, data, rest)) => {
                    tick += u64::from(delta);
                    warn!(
                        track_index,
                        tick,
                        meta_type,
                        len = data.len(),
                        "keeping undecodable meta event raw"
                    );
                    issues.push(DecodeIssue {
                        track_index,
                        tick,
                        kind: DecodeIssueKind::RawMeta { meta_type },
                    });
                    decoded.push(Event {
                        tick,
                        track_index,
                        channel: None,
                        kind: EventKind::Meta {
                            kind: MetaKind::from_type_byte(meta_type),
                            data: data.to_vec(),
                        },
                    });
                    events = EventIter::new(rest).bytemapped();
                }
                None => {
                    warn!(
                        track_index,
                        tick,
                        unread = remaining.len(),
                        "undecodable event, dropping rest of track"
                    );
                    issues.push(DecodeIssue {
                        track_index,
                        tick,
                        kind: DecodeIssueKind::Truncated {
                            unread_bytes: remaining.len(),
                        },
                    });
                    break;
                }
            },
        }
    }

    decoded
}

fn read_varlen(raw: &mut &[u8]) -> Option<u32> {
    let mut value: u32 = 0;
    for _ in 0..4 {
        let (&byte, rest) = raw.split_first()?;
        *raw = rest;
        value = value << 7 | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Some(value);
        }
    }
    None
}

/// `FF <type> <varlen length> <data>` into `(type, data, rest)`.
fn split_meta(mut raw: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let (&0xFF, rest) = raw.split_first()? else {
        return None;
    };
    let (&meta_type, rest) = rest.split_first()?;
    raw = rest;
    let len = read_varlen(&mut raw)? as usize;
    (raw.len() >= len).then(|| (meta_type, &raw[..len], &raw[len..]))
}

/// A delta time followed by a meta event, read without interpreting the payload.
fn split_raw_meta_event(mut raw: &[u8]) -> Option<(u32, u8, &[u8], &[u8])> {
    let delta = read_varlen(&mut raw)?;
    let (meta_type, data, rest) = split_meta(raw)?;
    Some((delta, meta_type, data, rest))
}

/// `raw` is the event's bytes after its delta time.
fn convert_event(raw: &[u8], kind: TrackEventKind<'_>, tick: u64, track_index: usize) -> Event {
    let (channel, kind) = match kind {
        TrackEventKind::Midi { channel, message } => {
            (Some(channel.as_int()), convert_message(message))
        }
        TrackEventKind::SysEx(data) | TrackEventKind::Escape(data) => {
            (None, EventKind::SysEx { data: data.to_vec() })
        }
        // Payload exactly as stored, so length rules apply to what the file says
        TrackEventKind::Meta(_) => {
            let (meta_type, data) = split_meta(raw)
                .map(|(meta_type, data, _)| (meta_type, data.to_vec()))
                .unwrap_or((0xFF, Vec::new()));
            (
                None,
                EventKind::Meta {
                    kind: MetaKind::from_type_byte(meta_type),
                    data,
                },
            )
        }
    };

    Event {
        tick,
        track_index,
        channel,
        kind,
    }
}

fn convert_message(message: MidiMessage) -> EventKind {
    match message {
        MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
            note: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::NoteOff { key, vel } => EventKind::NoteOff {
            note: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::Aftertouch { key, vel } => EventKind::NoteAftertouch {
            note: key.as_int(),
            pressure: vel.as_int(),
        },
        MidiMessage::Controller { controller, value } => EventKind::Controller {
            controller: controller.as_int(),
            value: value.as_int(),
        },
        MidiMessage::ProgramChange { program } => EventKind::ProgramChange {
            program: program.as_int(),
        },
        MidiMessage::ChannelAftertouch { vel } => EventKind::ChannelAftertouch {
            pressure: vel.as_int(),
        },
        MidiMessage::PitchBend { bend } => EventKind::PitchBend {
            value: bend.0.as_int(),
        },
    }
}
