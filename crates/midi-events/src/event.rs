use serde::{Deserialize, Serialize};

/// Meta event kinds, named the way the tool layer reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetaKind {
    SequenceNumber,
    Text,
    CopyrightNotice,
    TrackName,
    InstrumentName,
    Lyrics,
    Marker,
    CuePoint,
    ProgramName,
    DeviceName,
    ChannelPrefix,
    MidiPort,
    EndOfTrack,
    SetTempo,
    SmpteOffset,
    TimeSignature,
    KeySignature,
    SequencerSpecific,
    Unknown,
}

impl MetaKind {
    /// Map a raw meta type byte to its kind.
    pub fn from_type_byte(byte: u8) -> Self {
        match byte {
            0x00 => MetaKind::SequenceNumber,
            0x01 => MetaKind::Text,
            0x02 => MetaKind::CopyrightNotice,
            0x03 => MetaKind::TrackName,
            0x04 => MetaKind::InstrumentName,
            0x05 => MetaKind::Lyrics,
            0x06 => MetaKind::Marker,
            0x07 => MetaKind::CuePoint,
            0x08 => MetaKind::ProgramName,
            0x09 => MetaKind::DeviceName,
            0x20 => MetaKind::ChannelPrefix,
            0x21 => MetaKind::MidiPort,
            0x2F => MetaKind::EndOfTrack,
            0x51 => MetaKind::SetTempo,
            0x54 => MetaKind::SmpteOffset,
            0x58 => MetaKind::TimeSignature,
            0x59 => MetaKind::KeySignature,
            0x7F => MetaKind::SequencerSpecific,
            _ => MetaKind::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MetaKind::SequenceNumber => "sequenceNumber",
            MetaKind::Text => "text",
            MetaKind::CopyrightNotice => "copyrightNotice",
            MetaKind::TrackName => "trackName",
            MetaKind::InstrumentName => "instrumentName",
            MetaKind::Lyrics => "lyrics",
            MetaKind::Marker => "marker",
            MetaKind::CuePoint => "cuePoint",
            MetaKind::ProgramName => "programName",
            MetaKind::DeviceName => "deviceName",
            MetaKind::ChannelPrefix => "channelPrefix",
            MetaKind::MidiPort => "midiPort",
            MetaKind::EndOfTrack => "endOfTrack",
            MetaKind::SetTempo => "setTempo",
            MetaKind::SmpteOffset => "smpteOffset",
            MetaKind::TimeSignature => "timeSignature",
            MetaKind::KeySignature => "keySignature",
            MetaKind::SequencerSpecific => "sequencerSpecific",
            MetaKind::Unknown => "unknown",
        }
    }

    /// Kinds whose payload is human-readable text.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            MetaKind::Text
                | MetaKind::TrackName
                | MetaKind::InstrumentName
                | MetaKind::Lyrics
                | MetaKind::Marker
                | MetaKind::CuePoint
        )
    }
}

impl std::fmt::Display for MetaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of a decoded event. Each variant carries only its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    NoteAftertouch { note: u8, pressure: u8 },
    Controller { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    ChannelAftertouch { pressure: u8 },
    /// Raw 14-bit value, 8192 = center
    PitchBend { value: u16 },
    SysEx { data: Vec<u8> },
    /// Meta events keep their raw payload; fixed-width decoding happens in
    /// the metadata extractor.
    Meta { kind: MetaKind, data: Vec<u8> },
}

impl EventKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::NoteOn { .. } => "noteOn",
            EventKind::NoteOff { .. } => "noteOff",
            EventKind::NoteAftertouch { .. } => "noteAftertouch",
            EventKind::Controller { .. } => "controller",
            EventKind::ProgramChange { .. } => "programChange",
            EventKind::ChannelAftertouch { .. } => "channelAftertouch",
            EventKind::PitchBend { .. } => "pitchBend",
            EventKind::SysEx { .. } => "sysEx",
            EventKind::Meta { .. } => "meta",
        }
    }
}

/// One decoded event at an absolute tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub tick: u64,
    pub track_index: usize,
    /// 0-15 for channel messages, `None` for sysex and meta
    pub channel: Option<u8>,
    pub kind: EventKind,
}

impl Event {
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    pub fn meta_kind(&self) -> Option<MetaKind> {
        match &self.kind {
            EventKind::Meta { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Meta payload when this is a meta event of the given kind.
    pub fn meta_payload(&self, wanted: MetaKind) -> Option<&[u8]> {
        match &self.kind {
            EventKind::Meta { kind, data } if *kind == wanted => Some(data),
            _ => None,
        }
    }

    /// `(note, velocity)` for a note-on that actually sounds.
    ///
    /// A note-on with velocity 0 is a note-off and yields `None`.
    pub fn sounding_note(&self) -> Option<(u8, u8)> {
        match self.kind {
            EventKind::NoteOn { note, velocity } if velocity > 0 => Some((note, velocity)),
            _ => None,
        }
    }

    /// Up to three positional values (`value1..value3`).
    pub fn values(&self) -> [Option<u32>; 3] {
        match &self.kind {
            EventKind::NoteOn { note, velocity } | EventKind::NoteOff { note, velocity } => {
                [Some(*note as u32), Some(*velocity as u32), None]
            }
            EventKind::NoteAftertouch { note, pressure } => {
                [Some(*note as u32), Some(*pressure as u32), None]
            }
            EventKind::Controller { controller, value } => {
                [Some(*controller as u32), Some(*value as u32), None]
            }
            EventKind::ProgramChange { program } => [Some(*program as u32), None, None],
            EventKind::ChannelAftertouch { pressure } => [Some(*pressure as u32), None, None],
            EventKind::PitchBend { value } => [Some(*value as u32), None, None],
            EventKind::SysEx { data } | EventKind::Meta { data, .. } => [
                data.first().map(|&b| b as u32),
                data.get(1).map(|&b| b as u32),
                data.get(2).map(|&b| b as u32),
            ],
        }
    }

    /// Serializable view of this event.
    pub fn details(&self) -> EventDetails {
        let [value1, value2, value3] = self.values();

        let (note, velocity) = match self.kind {
            EventKind::NoteOn { note, velocity } | EventKind::NoteOff { note, velocity } => {
                (Some(note), Some(velocity))
            }
            _ => (None, None),
        };

        let (data, meta_type, text) = match &self.kind {
            EventKind::Meta { kind, data } => {
                let text = kind
                    .is_text()
                    .then(|| String::from_utf8_lossy(data).into_owned());
                (Some(data.clone()), Some(kind.name().to_string()), text)
            }
            EventKind::SysEx { data } => (Some(data.clone()), None, None),
            _ => (None, None, None),
        };

        EventDetails {
            tick: self.tick,
            event_type: self.type_name().to_string(),
            track_index: self.track_index,
            channel: self.channel,
            note,
            velocity,
            value1,
            value2,
            value3,
            data,
            meta_type,
            text,
        }
    }
}

/// Flattened event shape returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub tick: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub track_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value1: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value3: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}
