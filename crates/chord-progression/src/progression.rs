use serde::{Deserialize, Serialize};

use crate::chords::ChordIdentifier;
use crate::cluster::NoteCluster;

/// A tick range carrying one chord name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordSpan {
    pub name: String,
    pub start_tick: u64,
    pub end_tick: u64,
    /// Notes of the cluster that opened the span
    pub notes: Vec<u8>,
}

impl ChordSpan {
    pub fn duration_ticks(&self) -> u64 {
        self.end_tick.saturating_sub(self.start_tick)
    }
}

/// Name each cluster and collapse repeats into spans.
///
/// Unnamed clusters are dropped. A cluster with the same name as the last
/// kept span is absorbed into it. Each new span closes the previous one at
/// its own start tick; the final span ends at `last_note_tick`.
pub fn build_progression(
    clusters: &[NoteCluster],
    last_note_tick: u64,
    identifier: &impl ChordIdentifier,
) -> Vec<ChordSpan> {
    let mut spans: Vec<ChordSpan> = Vec::new();

    for cluster in clusters {
        let Some(name) = identifier.identify(&cluster.notes) else {
            continue;
        };

        if let Some(previous) = spans.last_mut() {
            if previous.name == name {
                continue;
            }
            previous.end_tick = cluster.start_tick;
        }

        spans.push(ChordSpan {
            name,
            start_tick: cluster.start_tick,
            end_tick: cluster.start_tick,
            notes: cluster.notes.clone(),
        });
    }

    if let Some(last) = spans.last_mut() {
        last.end_tick = last_note_tick.max(last.start_tick);
    }

    spans
}
