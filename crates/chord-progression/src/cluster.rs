use midi_events::Event;
use serde::{Deserialize, Serialize};

use crate::tick_clock::TickClock;

/// Notes closer together than this are treated as one chord.
pub const DEFAULT_GROUPING_THRESHOLD_MS: f64 = 50.0;

/// Notes judged simultaneous, in arrival order (duplicates kept).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCluster {
    pub start_tick: u64,
    pub notes: Vec<u8>,
}

/// `(tick, note)` for every sounding note-on, ascending by tick.
///
/// Velocity-0 note-ons are note-offs and are left out. The sort is stable,
/// so simultaneous notes keep their arrival order.
pub fn sounding_notes(events: &[Event]) -> Vec<(u64, u8)> {
    let mut notes: Vec<(u64, u8)> = events
        .iter()
        .filter_map(|e| e.sounding_note().map(|(note, _)| (e.tick, note)))
        .collect();
    notes.sort_by_key(|&(tick, _)| tick);
    notes
}

/// Group ascending notes into clusters.
///
/// A note joins the current cluster when it starts less than `threshold_ms`
/// after the previous note (not the cluster's first note), so a slow
/// arpeggio of closely spaced notes chains into one cluster.
pub fn cluster_notes(notes: &[(u64, u8)], clock: &TickClock, threshold_ms: f64) -> Vec<NoteCluster> {
    let Some(&(first_tick, first_note)) = notes.first() else {
        return Vec::new();
    };

    let mut clusters = Vec::new();
    let mut current = NoteCluster {
        start_tick: first_tick,
        notes: vec![first_note],
    };
    let mut prev_ms = clock.ticks_to_ms(first_tick);

    for &(tick, note) in &notes[1..] {
        let now_ms = clock.ticks_to_ms(tick);
        if now_ms - prev_ms < threshold_ms {
            current.notes.push(note);
        } else {
            let finished = std::mem::replace(
                &mut current,
                NoteCluster {
                    start_tick: tick,
                    notes: vec![note],
                },
            );
            clusters.push(finished);
        }
        prev_ms = now_ms;
    }
    clusters.push(current);

    clusters
}

/// [`sounding_notes`] followed by [`cluster_notes`].
pub fn cluster_events(events: &[Event], clock: &TickClock, threshold_ms: f64) -> Vec<NoteCluster> {
    cluster_notes(&sounding_notes(events), clock, threshold_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_clock::{TempoMap, TempoMarker};
    use midi_events::EventKind;
    use pretty_assertions::assert_eq;

    fn clock_120() -> TickClock {
        // 480 PPQ at 120 BPM: 1 tick = 1.0417 ms
        TickClock::new(TempoMap::default(), 480).unwrap()
    }

    fn note_on(tick: u64, note: u8, velocity: u8) -> Event {
        Event {
            tick,
            track_index: 0,
            channel: Some(0),
            kind: EventKind::NoteOn { note, velocity },
        }
    }

    #[test]
    fn no_notes_no_clusters() {
        assert!(cluster_notes(&[], &clock_120(), 50.0).is_empty());
        let only_off = vec![note_on(0, 60, 0)];
        assert!(cluster_events(&only_off, &clock_120(), 50.0).is_empty());
    }

    #[test]
    fn simultaneous_notes_group() {
        let notes = [(0, 60), (0, 64), (0, 67), (480, 65), (480, 69), (480, 72)];
        let clusters = cluster_notes(&notes, &clock_120(), 50.0);
        assert_eq!(
            clusters,
            vec![
                NoteCluster {
                    start_tick: 0,
                    notes: vec![60, 64, 67]
                },
                NoteCluster {
                    start_tick: 480,
                    notes: vec![65, 69, 72]
                },
            ]
        );
    }

    #[test]
    fn gap_is_measured_from_previous_note() {
        // 40 ticks ≈ 41.7 ms apart each: chains into one cluster even though
        // the last note is 125 ms after the first
        let notes = [(0, 60), (40, 64), (80, 67), (120, 71)];
        let clusters = cluster_notes(&notes, &clock_120(), 50.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].notes, vec![60, 64, 67, 71]);
    }

    #[test]
    fn gap_equal_to_threshold_splits() {
        // 48 ticks at 480 PPQ / 60 BPM = exactly 100 ms
        let clock = TickClock::new(
            TempoMap::new(vec![TempoMarker {
                tick: 0,
                microseconds_per_beat: 1_000_000,
            }]),
            480,
        )
        .unwrap();
        let clusters = cluster_notes(&[(0, 60), (48, 64)], &clock, 100.0);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn velocity_zero_and_other_events_are_ignored() {
        let events = vec![
            note_on(0, 60, 90),
            note_on(0, 64, 0),
            Event {
                tick: 0,
                track_index: 0,
                channel: Some(0),
                kind: EventKind::NoteOff {
                    note: 55,
                    velocity: 0,
                },
            },
            note_on(0, 67, 90),
        ];
        let clusters = cluster_events(&events, &clock_120(), 50.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].notes, vec![60, 67]);
    }

    #[test]
    fn tempo_change_affects_grouping() {
        // Same 40-tick spacing: 41.7 ms at 120 BPM, 166.7 ms at 30 BPM
        let map = TempoMap::new(vec![
            TempoMarker {
                tick: 0,
                microseconds_per_beat: 500_000,
            },
            TempoMarker {
                tick: 1000,
                microseconds_per_beat: 2_000_000,
            },
        ]);
        let clock = TickClock::new(map, 480).unwrap();
        let notes = [(0, 60), (40, 64), (1000, 60), (1040, 64)];
        let clusters = cluster_notes(&notes, &clock, 50.0);
        let sizes: Vec<usize> = clusters.iter().map(|c| c.notes.len()).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
    }

    #[test]
    fn larger_threshold_only_merges_clusters() {
        let notes: Vec<(u64, u8)> = [0u64, 10, 30, 90, 200, 210, 400, 1000, 1010, 1500]
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, 60 + i as u8))
            .collect();
        let clock = clock_120();

        let thresholds = [0.0, 5.0, 20.0, 50.0, 100.0, 250.0, 1000.0];
        let mut prev_count = usize::MAX;
        for threshold in thresholds {
            let count = cluster_notes(&notes, &clock, threshold).len();
            assert!(count <= prev_count, "threshold {threshold} gave {count} > {prev_count}");
            prev_count = count;
        }

        // Clusters only merge: each one sits whole inside a cluster at any larger threshold
        for pair in thresholds.windows(2) {
            let smaller = cluster_notes(&notes, &clock, pair[0]);
            let larger = cluster_notes(&notes, &clock, pair[1]);
            for cluster in &smaller {
                let host = larger
                    .iter()
                    .find(|c| c.notes.contains(&cluster.notes[0]))
                    .unwrap();
                assert!(
                    cluster.notes.iter().all(|n| host.notes.contains(n)),
                    "{:?} split apart between {} and {} ms",
                    cluster.notes,
                    pair[0],
                    pair[1]
                );
                assert!(host.notes.len() >= cluster.notes.len());
            }
        }
        assert_eq!(cluster_notes(&notes, &clock, 0.0).len(), notes.len());
        assert_eq!(cluster_notes(&notes, &clock, 1000.0).len(), 1);
    }
}
