//! Predicate filters over decoded events.
//!
//! Every filter is an independent narrowing predicate, so combining them is
//! a logical AND. [`EventFilter::apply`] evaluates them in a fixed order:
//! time range, type, channel, positional values, meta type.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Inclusive tick range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_tick: u64,
    pub end_tick: u64,
}

impl TimeRange {
    pub fn contains(&self, tick: u64) -> bool {
        self.start_tick <= tick && tick <= self.end_tick
    }
}

/// Equality on up to three positional values; `None` is a wildcard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFilter {
    pub value1: Option<u32>,
    pub value2: Option<u32>,
    pub value3: Option<u32>,
}

impl ValueFilter {
    pub fn is_empty(&self) -> bool {
        self.value1.is_none() && self.value2.is_none() && self.value3.is_none()
    }

    pub fn matches(&self, event: &Event) -> bool {
        let actual = event.values();
        [self.value1, self.value2, self.value3]
            .into_iter()
            .zip(actual)
            .all(|(wanted, actual)| wanted.map_or(true, |w| actual == Some(w)))
    }
}

/// Any subset of the event predicates. Empty lists mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub time_range: Option<TimeRange>,
    pub event_types: Vec<String>,
    pub channels: Vec<u8>,
    pub values: ValueFilter,
    pub meta_types: Vec<String>,
}

impl EventFilter {
    pub fn is_empty(&self) -> bool {
        self.time_range.is_none()
            && self.event_types.is_empty()
            && self.channels.is_empty()
            && self.values.is_empty()
            && self.meta_types.is_empty()
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.time_range.map_or(true, |range| range.contains(event.tick))
            && (self.event_types.is_empty() || type_matches(event, &self.event_types))
            && (self.channels.is_empty() || channel_matches(event, &self.channels))
            && self.values.matches(event)
            && (self.meta_types.is_empty() || meta_type_matches(event, &self.meta_types))
    }

    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }
}

pub fn by_time_range(events: &[Event], range: TimeRange) -> Vec<Event> {
    retain(events, |e| range.contains(e.tick))
}

pub fn by_type(events: &[Event], event_types: &[String]) -> Vec<Event> {
    retain(events, |e| type_matches(e, event_types))
}

/// Events without a channel (sysex, meta) never match.
pub fn by_channel(events: &[Event], channels: &[u8]) -> Vec<Event> {
    retain(events, |e| channel_matches(e, channels))
}

pub fn by_value(events: &[Event], values: &ValueFilter) -> Vec<Event> {
    retain(events, |e| values.matches(e))
}

/// Non-meta events never match.
pub fn by_meta_type(events: &[Event], meta_types: &[String]) -> Vec<Event> {
    retain(events, |e| meta_type_matches(e, meta_types))
}

fn retain(events: &[Event], keep: impl Fn(&Event) -> bool) -> Vec<Event> {
    events.iter().filter(|e| keep(e)).cloned().collect()
}

fn type_matches(event: &Event, event_types: &[String]) -> bool {
    event_types.iter().any(|t| t == event.type_name())
}

fn channel_matches(event: &Event, channels: &[u8]) -> bool {
    event.channel.is_some_and(|c| channels.contains(&c))
}

fn meta_type_matches(event: &Event, meta_types: &[String]) -> bool {
    event
        .meta_kind()
        .is_some_and(|kind| meta_types.iter().any(|t| t == kind.name()))
}
