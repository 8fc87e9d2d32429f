//! Tick → millisecond conversion over a full tempo map.
//!
//! Each tempo marker opens a segment that lasts until the next marker; the
//! last segment is open-ended. Elapsed time for a tick is the sum of the
//! closed segments before it plus the partial segment containing it.

use midi_events::{extract_metadata, Event, TempoInfo};
use serde::{Deserialize, Serialize};

/// 120 BPM, assumed until the first tempo marker.
pub const DEFAULT_MICROSECONDS_PER_BEAT: u32 = 500_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoMarker {
    pub tick: u64,
    pub microseconds_per_beat: u32,
}

/// Ascending tempo markers. Never empty and always starts at tick 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempoMap {
    markers: Vec<TempoMarker>,
}

impl TempoMap {
    pub fn new(mut markers: Vec<TempoMarker>) -> Self {
        markers.retain(|m| m.microseconds_per_beat > 0);
        markers.sort_by_key(|m| m.tick);

        if markers.first().map_or(true, |m| m.tick > 0) {
            markers.insert(
                0,
                TempoMarker {
                    tick: 0,
                    microseconds_per_beat: DEFAULT_MICROSECONDS_PER_BEAT,
                },
            );
        }

        Self { markers }
    }

    pub fn from_tempo_info(tempo: &[TempoInfo]) -> Self {
        Self::new(
            tempo
                .iter()
                .map(|t| TempoMarker {
                    tick: t.tick,
                    microseconds_per_beat: t.microseconds_per_beat,
                })
                .collect(),
        )
    }

    /// Tempo map from the tempo meta events in `events`.
    pub fn from_events(events: &[Event]) -> Self {
        Self::from_tempo_info(&extract_metadata(events).tempo)
    }

    pub fn markers(&self) -> &[TempoMarker] {
        &self.markers
    }
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Tempo map plus PPQ, with the elapsed time at each marker precomputed.
#[derive(Debug, Clone)]
pub struct TickClock {
    markers: Vec<TempoMarker>,
    offsets_ms: Vec<f64>,
    ppq: f64,
}

impl TickClock {
    pub fn new(tempo_map: TempoMap, ppq: u16) -> crate::Result<Self> {
        if ppq == 0 {
            return Err(crate::Error::InvalidPpq);
        }
        let ppq = ppq as f64;
        let markers = tempo_map.markers;

        let mut offsets_ms = Vec::with_capacity(markers.len());
        let mut elapsed = 0.0;
        offsets_ms.push(elapsed);
        for pair in markers.windows(2) {
            elapsed += segment_ms(pair[1].tick - pair[0].tick, pair[0].microseconds_per_beat, ppq);
            offsets_ms.push(elapsed);
        }

        Ok(Self {
            markers,
            offsets_ms,
            ppq,
        })
    }

    /// Elapsed milliseconds from tick 0 to `tick`.
    pub fn ticks_to_ms(&self, tick: u64) -> f64 {
        // markers[0].tick == 0, so at least one marker is <= tick
        let index = self
            .markers
            .partition_point(|m| m.tick <= tick)
            .saturating_sub(1);
        let marker = self.markers[index];

        self.offsets_ms[index]
            + segment_ms(tick - marker.tick, marker.microseconds_per_beat, self.ppq)
    }
}

/// One-shot conversion; prefer a [`TickClock`] for repeated lookups.
pub fn ticks_to_milliseconds(tick: u64, tempo_map: &TempoMap, ppq: u16) -> crate::Result<f64> {
    Ok(TickClock::new(tempo_map.clone(), ppq)?.ticks_to_ms(tick))
}

fn segment_ms(ticks: u64, microseconds_per_beat: u32, ppq: f64) -> f64 {
    (ticks as f64 / ppq) * (microseconds_per_beat as f64 / 1000.0)
}
