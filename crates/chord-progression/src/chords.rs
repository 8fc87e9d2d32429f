//! Naming a cluster of simultaneous notes.
//!
//! Root candidates are tried in the order their pitch class first arrived,
//! and for each root the dictionary is tried in priority order. The first
//! contained template wins; there is no scoring across candidates.

use std::fmt;

use serde::Serialize;

use crate::chord_templates::{interval_mask, note_name, tension_name, CHORD_DICTIONARY};

/// A named chord: root, type suffix, tensions and bass note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordMatch {
    pub root_pitch_class: u8,
    pub type_name: &'static str,
    /// Ascending by interval above the root
    pub tensions: Vec<&'static str>,
    pub bass_pitch_class: u8,
}

impl ChordMatch {
    /// `Cmaj7`, `Cmaj(9,#11)`, `Amin7/C`.
    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn is_inversion(&self) -> bool {
        self.bass_pitch_class != self.root_pitch_class
    }
}

impl fmt::Display for ChordMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", note_name(self.root_pitch_class), self.type_name)?;
        if !self.tensions.is_empty() {
            write!(f, "({})", self.tensions.join(","))?;
        }
        if self.is_inversion() {
            write!(f, "/{}", note_name(self.bass_pitch_class))?;
        }
        Ok(())
    }
}

/// Pluggable chord naming for the progression builder.
pub trait ChordIdentifier {
    /// Chord name for the notes of one cluster, or `None` for no chord.
    fn identify(&self, notes: &[u8]) -> Option<String>;
}

/// First-fit dictionary matching via [`identify_chord`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFitIdentifier;

impl ChordIdentifier for FirstFitIdentifier {
    fn identify(&self, notes: &[u8]) -> Option<String> {
        identify_chord(notes).map(|chord| chord.name())
    }
}

impl<F> ChordIdentifier for F
where
    F: Fn(&[u8]) -> Option<String>,
{
    fn identify(&self, notes: &[u8]) -> Option<String> {
        self(notes)
    }
}

/// Pitch classes in first-arrival order, each kept once.
pub fn stable_unique_pitch_classes(notes: &[u8]) -> Vec<u8> {
    let mut seen = 0u16;
    let mut pitch_classes = Vec::with_capacity(12);
    for &note in notes {
        let pc = note % 12;
        if seen & (1 << pc) == 0 {
            seen |= 1 << pc;
            pitch_classes.push(pc);
        }
    }
    pitch_classes
}

/// Identify the chord formed by `notes` (MIDI note numbers, arrival order).
///
/// Returns `None` for fewer than three notes or when no root/template pair
/// matches.
pub fn identify_chord(notes: &[u8]) -> Option<ChordMatch> {
    if notes.len() < 3 {
        return None;
    }

    let pitch_classes = stable_unique_pitch_classes(notes);
    let bass_pitch_class = notes.iter().min()? % 12;

    pitch_classes.iter().find_map(|&root| {
        let intervals = interval_mask(&pitch_classes, root);
        let template = CHORD_DICTIONARY
            .iter()
            .find(|t| t.is_contained_in(intervals))?;

        let leftover = intervals & !template.mask;
        let tensions = (0..12u8)
            .filter(|i| leftover & (1 << i) != 0)
            .filter_map(tension_name)
            .collect();

        Some(ChordMatch {
            root_pitch_class: root,
            type_name: template.suffix,
            tensions,
            bass_pitch_class,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn name(notes: &[u8]) -> Option<String> {
        identify_chord(notes).map(|c| c.name())
    }

    #[test]
    fn seventh_beats_its_triad() {
        assert_eq!(name(&[60, 64, 67, 71]).as_deref(), Some("Cmaj7"));
    }

    #[test]
    fn triad_with_added_ninth() {
        assert_eq!(name(&[60, 64, 67, 62]).as_deref(), Some("Cmaj(9)"));
    }

    #[test]
    fn several_tensions_ascend() {
        assert_eq!(name(&[60, 64, 67, 66, 62]).as_deref(), Some("Cmaj(9,#11)"));
    }

    #[test]
    fn root_position_has_no_slash() {
        assert_eq!(name(&[60, 64, 67]).as_deref(), Some("Cmaj"));
        // C is lowest even though it arrives last
        assert_eq!(name(&[64, 67, 60]).as_deref(), Some("Cmaj"));
    }

    #[test]
    fn bass_is_lowest_note_number() {
        // G4 C5 E5: root C, bass G
        let chord = identify_chord(&[67, 72, 76]).unwrap();
        assert_eq!(chord.root_pitch_class, 0);
        assert_eq!(chord.bass_pitch_class, 7);
        assert_eq!(chord.name(), "Cmaj/G");
    }

    #[test]
    fn fewer_than_three_notes() {
        assert_eq!(identify_chord(&[60, 64]), None);
        assert_eq!(identify_chord(&[]), None);
    }

    #[test]
    fn octave_doublings_are_not_a_chord() {
        assert_eq!(identify_chord(&[60, 72, 84]), None);
        assert_eq!(name(&[60, 72, 64, 67]).as_deref(), Some("Cmaj"));
    }

    #[test]
    fn dictionary_types() {
        assert_eq!(name(&[57, 60, 64, 67]).as_deref(), Some("Amin7"));
        assert_eq!(name(&[55, 59, 62, 65, 69]).as_deref(), Some("G9"));
        assert_eq!(name(&[60, 64, 67, 71, 74]).as_deref(), Some("Cmaj9"));
        assert_eq!(name(&[62, 65, 69, 72, 76]).as_deref(), Some("Dmin9"));
        assert_eq!(name(&[67, 71, 74, 77]).as_deref(), Some("G7"));
        assert_eq!(name(&[71, 74, 77, 81]).as_deref(), Some("Bm7b5"));
        assert_eq!(name(&[59, 62, 65, 68]).as_deref(), Some("Bdim7"));
        assert_eq!(name(&[59, 62, 65]).as_deref(), Some("Bdim"));
        assert_eq!(name(&[60, 64, 68]).as_deref(), Some("Caug"));
        assert_eq!(name(&[60, 65, 67]).as_deref(), Some("Csus4"));
        assert_eq!(name(&[60, 62, 67]).as_deref(), Some("Csus2"));
    }

    #[test]
    fn arrival_order_picks_the_root() {
        // Same pitch classes, different first arrival
        assert_eq!(name(&[60, 64, 67, 69]).as_deref(), Some("Cmaj(13)"));
        assert_eq!(name(&[69, 60, 64, 67]).as_deref(), Some("Amin7/C"));
    }

    #[test]
    fn unnamed_leftovers_are_dropped() {
        // C E G# B: aug matches, the major seventh has no tension name
        let chord = identify_chord(&[60, 64, 68, 71]).unwrap();
        assert_eq!(chord.type_name, "aug");
        assert!(chord.tensions.is_empty());
        assert_eq!(chord.name(), "Caug");
    }

    #[test]
    fn no_template_matches() {
        // C C# D: no root yields a dictionary chord
        assert_eq!(identify_chord(&[60, 61, 62]), None);
    }

    #[test]
    fn stable_unique_keeps_first_arrival() {
        assert_eq!(stable_unique_pitch_classes(&[67, 60, 79, 64, 72]), vec![7, 0, 4]);
    }

    #[test]
    fn closures_are_identifiers() {
        let always_x = |_: &[u8]| Some("X".to_string());
        assert_eq!(always_x.identify(&[1, 2, 3]).as_deref(), Some("X"));
        assert_eq!(
            FirstFitIdentifier.identify(&[60, 64, 67]).as_deref(),
            Some("Cmaj")
        );
    }

    #[test]
    fn match_serializes_camel_case() {
        let chord = identify_chord(&[60, 64, 67, 62]).unwrap();
        let json = serde_json::to_value(&chord).unwrap();
        assert_eq!(json["rootPitchClass"], 0);
        assert_eq!(json["typeName"], "maj");
        assert_eq!(json["tensions"][0], "9");
    }
}
