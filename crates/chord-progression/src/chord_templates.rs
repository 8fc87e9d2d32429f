/// A chord type: name suffix + interval set from root (as bitmask over 12 pitch classes).
#[derive(Debug)]
pub struct ChordTemplate {
    pub suffix: &'static str,
    /// Bit `i` set means interval `i mod 12` is in the template
    pub mask: u16,
}

impl ChordTemplate {
    const fn new(suffix: &'static str, intervals: &'static [u8]) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < intervals.len() {
            mask |= 1 << (intervals[i] % 12);
            i += 1;
        }
        Self { suffix, mask }
    }

    /// Every template interval is present in `interval_mask`.
    pub fn is_contained_in(&self, interval_mask: u16) -> bool {
        self.mask & interval_mask == self.mask
    }
}

/// Recognized chord types in match priority order: ninths, then sevenths,
/// then triads. The first contained template wins.
pub static CHORD_DICTIONARY: &[ChordTemplate] = &[
    ChordTemplate::new("maj9", &[0, 4, 7, 11, 14]),
    ChordTemplate::new("9", &[0, 4, 7, 10, 14]),
    ChordTemplate::new("min9", &[0, 3, 7, 10, 14]),
    ChordTemplate::new("maj7", &[0, 4, 7, 11]),
    ChordTemplate::new("min7", &[0, 3, 7, 10]),
    ChordTemplate::new("7", &[0, 4, 7, 10]),
    ChordTemplate::new("m7b5", &[0, 3, 6, 10]),
    ChordTemplate::new("dim7", &[0, 3, 6, 9]),
    ChordTemplate::new("maj", &[0, 4, 7]),
    ChordTemplate::new("min", &[0, 3, 7]),
    ChordTemplate::new("dim", &[0, 3, 6]),
    ChordTemplate::new("aug", &[0, 4, 8]),
    ChordTemplate::new("sus4", &[0, 5, 7]),
    ChordTemplate::new("sus2", &[0, 2, 7]),
];

/// Interval above the root → tension name. Intervals not listed here are
/// never reported as tensions.
static TENSION_NAMES: [(u8, &str); 7] = [
    (1, "b9"),
    (2, "9"),
    (3, "#9"),
    (5, "11"),
    (6, "#11"),
    (8, "b13"),
    (9, "13"),
];

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn note_name(pitch_class: u8) -> &'static str {
    NOTE_NAMES[(pitch_class % 12) as usize]
}

pub fn tension_name(interval: u8) -> Option<&'static str> {
    TENSION_NAMES
        .iter()
        .find(|(i, _)| *i == interval % 12)
        .map(|(_, name)| *name)
}

/// Intervals of each pitch class above `root`, as a bitmask.
pub fn interval_mask(pitch_classes: &[u8], root: u8) -> u16 {
    pitch_classes
        .iter()
        .fold(0u16, |mask, &pc| mask | 1u16 << ((pc % 12 + 12 - root % 12) % 12))
}
